//! The entities the map viewer shows. Anything can write to [`Selection`], the viewer picks up
//! the change on the next frame and sends [`SelectionChanged`].

use bevy::prelude::*;

/// The selected entities, in the order they were selected.
#[derive(Resource, Default, Clone, Debug)]
pub struct Selection {
    entities: Vec<Entity>,
}

impl Selection {
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Add an entity to the selection. Returns false if it was already selected.
    pub fn select(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Remove an entity from the selection. Returns false if it was not selected.
    pub fn deselect(&mut self, entity: Entity) -> bool {
        let before = self.entities.len();
        self.entities.retain(|&selected| selected != entity);
        self.entities.len() != before
    }

    pub fn toggle(&mut self, entity: Entity) {
        if !self.deselect(entity) {
            self.entities.push(entity);
        }
    }

    /// Select exactly one entity.
    pub fn set(&mut self, entity: Entity) {
        self.entities.clear();
        self.entities.push(entity);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Drop entities that no longer exist.
    pub fn retain_alive(&mut self, world: &World) {
        self.entities.retain(|&entity| world.get_entity(entity).is_some());
    }
}

/// Sent when [`Selection`] changes.
#[derive(Event, Clone, Debug)]
pub struct SelectionChanged;

pub(crate) fn detect_selection_change(
    selection: Res<Selection>,
    mut changed: EventWriter<SelectionChanged>,
) {
    if selection.is_changed() && !selection.is_added() {
        changed.send(SelectionChanged);
    }
}

/// Drop despawned entities from the selection. Leaves the resource untouched, and so unchanged,
/// when every selected entity is alive.
pub(crate) fn prune_selection(world: &mut World) {
    let Some(selection) = world.get_resource::<Selection>() else {
        return;
    };
    let dead = selection
        .entities()
        .iter()
        .any(|&entity| world.get_entity(entity).is_none());
    if dead {
        world.resource_scope(|world, mut selection: Mut<Selection>| selection.retain_alive(world));
    }
}
