//! Finds the map fields of reflected components.

use std::fmt;

use bevy::ecs::component::ComponentId;
use bevy::prelude::*;
use bevy::reflect::{Map, ReflectMut, ReflectRef, TypeRegistry};

/// Where a map field sits on its component.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// A named field of a struct.
    Named(String),
    /// A field of a tuple struct.
    Index(usize),
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Named(name) => f.write_str(name),
            FieldPath::Index(index) => write!(f, ".{index}"),
        }
    }
}

impl FieldPath {
    /// The map at this path on `owner`, if the field exists and is a map.
    pub fn map<'a>(&self, owner: &'a dyn Reflect) -> Option<&'a dyn Map> {
        let field = match (self, owner.reflect_ref()) {
            (FieldPath::Named(name), ReflectRef::Struct(owner)) => owner.field(name)?,
            (FieldPath::Index(index), ReflectRef::TupleStruct(owner)) => owner.field(*index)?,
            _ => return None,
        };
        match field.reflect_ref() {
            ReflectRef::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn map_mut<'a>(&self, owner: &'a mut dyn Reflect) -> Option<&'a mut dyn Map> {
        let field = match (self, owner.reflect_mut()) {
            (FieldPath::Named(name), ReflectMut::Struct(owner)) => owner.field_mut(name)?,
            (FieldPath::Index(index), ReflectMut::TupleStruct(owner)) => owner.field_mut(*index)?,
            _ => return None,
        };
        match field.reflect_mut() {
            ReflectMut::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Every field of `owner` that holds a map, in field order. Only structs and tuple structs have
/// fields, anything else has no map fields.
pub fn find_mapping_fields(owner: &dyn Reflect) -> Vec<FieldPath> {
    let is_map = |field: Option<&dyn Reflect>| {
        field.is_some_and(|field| matches!(field.reflect_ref(), ReflectRef::Map(_)))
    };

    match owner.reflect_ref() {
        ReflectRef::Struct(owner) => (0..owner.field_len())
            .filter(|&i| is_map(owner.field_at(i)))
            .filter_map(|i| owner.name_at(i))
            .map(|name| FieldPath::Named(name.to_string()))
            .collect(),
        ReflectRef::TupleStruct(owner) => (0..owner.field_len())
            .filter(|&i| is_map(owner.field(i)))
            .map(FieldPath::Index)
            .collect(),
        _ => Vec::new(),
    }
}

/// A component that has at least one map field.
#[derive(Clone)]
pub struct Behavior {
    pub component: ComponentId,
    /// Short type path of the component.
    pub name: String,
    pub reflect: ReflectComponent,
    pub fields: Vec<FieldPath>,
}

/// The reflected components of `entity` that have map fields, sorted by name. Components that are
/// not registered with [`ReflectComponent`] are skipped.
pub fn mapping_behaviors(world: &World, registry: &TypeRegistry, entity: Entity) -> Vec<Behavior> {
    let Some(entity_ref) = world.get_entity(entity) else {
        return Vec::new();
    };

    let mut behaviors = Vec::new();
    for component in entity_ref.archetype().components() {
        let Some(type_id) = world
            .components()
            .get_info(component)
            .and_then(|info| info.type_id())
        else {
            continue;
        };
        let Some(registration) = registry.get(type_id) else {
            continue;
        };
        let Some(reflect) = registration.data::<ReflectComponent>() else {
            continue;
        };
        let Some(value) = reflect.reflect(entity_ref) else {
            continue;
        };

        let fields = find_mapping_fields(value);
        if fields.is_empty() {
            continue;
        }
        behaviors.push(Behavior {
            component,
            name: registration.type_info().type_path_table().short_path().to_string(),
            reflect: reflect.clone(),
            fields,
        });
    }

    behaviors.sort_by(|a, b| a.name.cmp(&b.name));
    behaviors
}
