//! The tabs of the map viewer window.

pub mod mappings;
pub mod selection;

use bevy::prelude::*;

/// The entity's [`Name`], or its id if it has none.
pub(crate) fn entity_name(world: &World, entity: Entity) -> String {
    world
        .get::<Name>(entity)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("{entity:?}"))
}
