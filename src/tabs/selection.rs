//! The selection tab. Lists the entities of the world and picks the ones the mappings tab shows.

use bevy::prelude::*;
use bevy_egui::egui::{self, Ui};

use crate::selection::Selection;
use crate::Tab;

use super::entity_name;
use super::mappings::discovery::mapping_behaviors;

#[derive(Default)]
pub(crate) struct SelectionTab {
    search: String,
    only_mappings: bool,
}

/// An entity as listed by the selection tab.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Listed {
    pub entity: Entity,
    pub name: String,
    pub has_mappings: bool,
}

impl SelectionTab {
    /// The entities to list, sorted by id and filtered by the search text.
    pub(crate) fn listed(&self, world: &World) -> Vec<Listed> {
        let registry = world.get_resource::<AppTypeRegistry>().map(|r| r.read());

        let mut entities = world
            .iter_entities()
            .map(|entity| entity.id())
            .collect::<Vec<_>>();
        entities.sort();

        entities
            .into_iter()
            .filter_map(|entity| {
                let name = entity_name(world, entity);
                if !name.to_lowercase().contains(&self.search.to_lowercase()) {
                    return None;
                }
                let has_mappings = registry.as_ref().is_some_and(|registry| {
                    !mapping_behaviors(world, registry, entity).is_empty()
                });
                if self.only_mappings && !has_mappings {
                    return None;
                }
                Some(Listed {
                    entity,
                    name,
                    has_mappings,
                })
            })
            .collect()
    }
}

impl Tab for SelectionTab {
    fn name(&self) -> &str {
        "Selection"
    }

    fn draw(&mut self, ui: &mut Ui, world: &mut World) {
        ui.vertical_centered(|ui| {
            egui::TextEdit::singleline(&mut self.search)
                .clip_text(false)
                .min_size(egui::vec2(ui.available_width() * 0.9, 0.0))
                .hint_text("Search for an entity")
                .show(ui);
        });

        let mut clear = false;
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.only_mappings, "Only entities with mappings");
            clear = ui.button("clear selection").clicked();
        });
        ui.separator();

        let mut toggled = None;
        {
            let selection = world.get_resource::<Selection>();
            for listed in self.listed(world) {
                let selected = selection.is_some_and(|selection| selection.contains(listed.entity));
                let text = match listed.has_mappings {
                    true => egui::RichText::new(&listed.name).strong(),
                    false => egui::RichText::new(&listed.name),
                };
                let response = ui.selectable_label(selected, text);
                let response = match listed.has_mappings {
                    true => response.on_hover_text("Has mapping fields"),
                    false => response,
                };
                if response.clicked() {
                    toggled = Some(listed.entity);
                }
            }
        }

        let Some(mut selection) = world.get_resource_mut::<Selection>() else {
            return;
        };
        if clear && !selection.is_empty() {
            selection.clear();
        }
        if let Some(entity) = toggled {
            selection.toggle(entity);
        }
    }
}
