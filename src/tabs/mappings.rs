//! The mappings tab. Shows every map field of the selected entities as a reorderable list of
//! `(key, value)` rows and writes edits straight back into the components.

pub mod adapter;
pub mod discovery;
pub mod list;

use bevy::ecs::component::ComponentId;
use bevy::prelude::*;
use bevy::reflect::TypeRegistry;
use bevy::utils::HashMap;
use bevy_egui::egui::{self, Ui};

use crate::bridge::PropertyBridge;
use crate::error::MappingEditError;
use crate::popups::{Popup, Popups};
use crate::selection::Selection;
use crate::settings::InspectorSettings;
use crate::Tab;

use self::adapter::{draw_view, MappingView, ViewStyle};
use self::discovery::{mapping_behaviors, Behavior, FieldPath};

use super::entity_name;

/// Identifies one map field of one component of one entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MappingFieldKey {
    pub entity: Entity,
    pub component: ComponentId,
    pub field: FieldPath,
}

/// Everything the mappings tab keeps between frames.
#[derive(Resource, Default)]
pub struct MappingState {
    bridge: PropertyBridge,
    views: HashMap<MappingFieldKey, MappingView>,
    behavior_folds: HashMap<(Entity, ComponentId), bool>,
    field_folds: HashMap<MappingFieldKey, bool>,
}

struct DrawContext<'a> {
    registry: &'a TypeRegistry,
    settings: &'a InspectorSettings,
    popups: &'a mut Popups,
}

impl MappingState {
    /// The bridge shared by every view. Register subtypes and custom editors through it.
    pub fn bridge_mut(&mut self) -> &mut PropertyBridge {
        &mut self.bridge
    }

    pub fn view(&self, key: &MappingFieldKey) -> Option<&MappingView> {
        self.views.get(key)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Drop the views and fold flags of entities that were despawned or lost the component.
    /// Returns the number of views dropped.
    pub fn sweep(&mut self, world: &World) -> usize {
        let alive = |entity: Entity, component: ComponentId| {
            world
                .get_entity(entity)
                .is_some_and(|entity| entity.contains_id(component))
        };

        let before = self.views.len();
        self.views.retain(|key, _| alive(key.entity, key.component));
        self.field_folds
            .retain(|key, _| alive(key.entity, key.component));
        self.behavior_folds
            .retain(|&(entity, component), _| alive(entity, component));

        let dropped = before - self.views.len();
        if dropped > 0 {
            debug!("dropped {dropped} mapping views");
        }
        dropped
    }

    /// Draw the mappings of `entities`, writing edits back into `world`.
    pub fn draw(
        &mut self,
        ui: &mut Ui,
        world: &mut World,
        registry: &TypeRegistry,
        settings: &InspectorSettings,
        popups: &mut Popups,
        entities: &[Entity],
    ) {
        self.sweep(world);

        if entities.is_empty() {
            ui.weak("Nothing selected. Pick entities in the Selection tab.");
            return;
        }

        let mut cx = DrawContext {
            registry,
            settings,
            popups,
        };
        for &entity in entities {
            if world.get_entity(entity).is_none() {
                continue;
            }
            ui.push_id(entity, |ui| self.draw_entity(ui, world, &mut cx, entity));
            ui.separator();
        }
    }

    fn draw_entity(&mut self, ui: &mut Ui, world: &mut World, cx: &mut DrawContext, entity: Entity) {
        let name = entity_name(world, entity);
        ui.vertical_centered(|ui| {
            ui.heading(&name);
        });

        let behaviors = mapping_behaviors(world, cx.registry, entity);
        if behaviors.is_empty() {
            ui.label(format!("No mapping found in {name}"));
            return;
        }

        for behavior in &behaviors {
            let fold = (entity, behavior.component);
            let open = *self
                .behavior_folds
                .entry(fold)
                .or_insert(cx.settings.behaviors_open_by_default);

            let response = egui::CollapsingHeader::new(behavior.name.as_str())
                .id_source(fold)
                .open(Some(open))
                .show(ui, |ui| {
                    for field in &behavior.fields {
                        self.draw_field(ui, world, cx, entity, behavior, field);
                    }
                });
            if response.header_response.clicked() {
                self.behavior_folds.insert(fold, !open);
            }
        }
    }

    fn draw_field(
        &mut self,
        ui: &mut Ui,
        world: &mut World,
        cx: &mut DrawContext,
        entity: Entity,
        behavior: &Behavior,
        field: &FieldPath,
    ) {
        let key = MappingFieldKey {
            entity,
            component: behavior.component,
            field: field.clone(),
        };
        let open = *self
            .field_folds
            .entry(key.clone())
            .or_insert(cx.settings.fields_open_by_default);

        let response = egui::CollapsingHeader::new(field.to_string())
            .id_source(&key)
            .open(Some(open))
            .show(ui, |ui| {
                if let Err(error) = self.edit_field(ui, world, cx, &key, behavior) {
                    warn!("{error}");
                    cx.popups.add(Popup::new(error.to_string()));
                }
            });
        if response.header_response.clicked() {
            self.field_folds.insert(key, !open);
        }
    }

    /// Snapshot one map, draw it, and write it back if it was edited.
    fn edit_field(
        &mut self,
        ui: &mut Ui,
        world: &mut World,
        cx: &mut DrawContext,
        key: &MappingFieldKey,
        behavior: &Behavior,
    ) -> Result<(), MappingEditError> {
        let missing = || MappingEditError::MissingField {
            component: behavior.name.clone(),
            field: key.field.to_string(),
        };

        let view = self.views.entry(key.clone()).or_default();
        {
            let entity = world.get_entity(key.entity).ok_or_else(missing)?;
            let component = behavior.reflect.reflect(entity).ok_or_else(missing)?;
            let map = key.field.map(component).ok_or_else(missing)?;
            view.snapshot(map, cx.registry);
        }

        let title = format!("{}.{}", behavior.name, key.field);
        let style = ViewStyle {
            title: &title,
            key_fraction: cx.settings.key_column_fraction,
            row_padding: cx.settings.row_padding,
        };
        let outcome = draw_view(ui, key, view, &mut self.bridge, cx.registry, &style);

        if outcome.write_back {
            let mut entity = world.get_entity_mut(key.entity).ok_or_else(missing)?;
            let mut component = behavior.reflect.reflect_mut(&mut entity).ok_or_else(missing)?;
            let map = key.field.map_mut(&mut *component).ok_or_else(missing)?;
            view.write_back(map, cx.registry);
            debug!("wrote {} rows back to {title}", view.rows().len());
        }

        match outcome.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub(crate) struct MappingsTab;

impl Tab for MappingsTab {
    fn name(&self) -> &str {
        "Mappings"
    }

    fn draw(&mut self, ui: &mut Ui, world: &mut World) {
        let Some(registry) = world.get_resource::<AppTypeRegistry>().cloned() else {
            ui.weak("No type registry");
            return;
        };
        let Some(mut state) = world.remove_resource::<MappingState>() else {
            return;
        };
        let mut popups = world.remove_resource::<Popups>().unwrap_or_default();
        let settings = world
            .get_resource::<InspectorSettings>()
            .cloned()
            .unwrap_or_default();
        let entities = world
            .get_resource::<Selection>()
            .map(|selection| selection.entities().to_vec())
            .unwrap_or_default();

        state.draw(
            ui,
            world,
            &registry.read(),
            &settings,
            &mut popups,
            &entities,
        );

        world.insert_resource(popups);
        world.insert_resource(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Component, Reflect, Default)]
    #[reflect(Component)]
    struct Scores {
        by_name: HashMap<String, i32>,
    }

    #[derive(Component, Reflect, Default)]
    #[reflect(Component)]
    struct Plain(f32);

    fn world_with_registry() -> World {
        let mut world = World::new();
        let registry = AppTypeRegistry::default();
        {
            let mut registry = registry.write();
            registry.register::<Scores>();
            registry.register::<Plain>();
        }
        world.insert_resource(registry);
        world
    }

    fn draw_once(state: &mut MappingState, world: &mut World, entities: &[Entity]) -> Popups {
        let settings = InspectorSettings {
            fields_open_by_default: true,
            ..default()
        };
        let registry = world.resource::<AppTypeRegistry>().clone();
        let mut popups = Popups::default();
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                state.draw(ui, world, &registry.read(), &settings, &mut popups, entities);
            });
        });
        popups
    }

    #[test]
    fn open_fields_get_a_view() {
        let mut world = world_with_registry();
        let mut scores = Scores::default();
        scores.by_name.insert("alice".to_string(), 10);
        let entity = world.spawn(scores).id();

        let mut state = MappingState::default();
        let popups = draw_once(&mut state, &mut world, &[entity]);
        assert!(popups.is_empty());
        assert_eq!(state.view_count(), 1);

        let component = world.components().component_id::<Scores>().unwrap();
        let view = state
            .view(&MappingFieldKey {
                entity,
                component,
                field: FieldPath::Named("by_name".to_string()),
            })
            .unwrap();
        assert_eq!(view.rows().len(), 1);
        assert_eq!(world.get::<Scores>(entity).unwrap().by_name.len(), 1);
    }

    #[test]
    fn entities_without_maps_get_no_views() {
        let mut world = world_with_registry();
        let entity = world.spawn(Plain(1.0)).id();
        let mut state = MappingState::default();
        draw_once(&mut state, &mut world, &[entity]);
        assert_eq!(state.view_count(), 0);
    }

    #[test]
    fn despawned_entities_are_swept() {
        let mut world = world_with_registry();
        let entity = world.spawn(Scores::default()).id();
        let mut state = MappingState::default();
        draw_once(&mut state, &mut world, &[entity]);
        assert_eq!(state.view_count(), 1);

        world.despawn(entity);
        assert_eq!(state.sweep(&world), 1);
        assert_eq!(state.view_count(), 0);
    }

    #[test]
    fn removed_components_are_swept() {
        let mut world = world_with_registry();
        let entity = world.spawn((Scores::default(), Plain(0.0))).id();
        let mut state = MappingState::default();
        draw_once(&mut state, &mut world, &[entity]);

        world.entity_mut(entity).remove::<Scores>();
        draw_once(&mut state, &mut world, &[entity]);
        assert_eq!(state.view_count(), 0);
    }
}
