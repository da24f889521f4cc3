use aether_mapview::bridge::matcher::CarrierMatcher;
use aether_mapview::bridge::{Bridged, PropertyBridge};
use aether_mapview::tabs::mappings::adapter::MappingView;
use aether_mapview::tabs::mappings::discovery::{mapping_behaviors, Behavior, FieldPath};
use aether_mapview::MappingEditError;
use bevy::prelude::*;
use bevy::reflect::TypeRegistry;
use bevy::utils::HashMap;

#[derive(Component, Reflect, Default)]
#[reflect(Component)]
struct Scores {
    by_name: HashMap<String, i32>,
}

#[derive(Component, Reflect, Default)]
#[reflect(Component)]
struct Waypoints(HashMap<i32, Option<Vec3>>);

fn setup() -> (World, AppTypeRegistry) {
    let registry = AppTypeRegistry::default();
    {
        let mut registry = registry.write();
        registry.register::<Scores>();
        registry.register::<Waypoints>();
    }
    let mut world = World::new();
    world.insert_resource(registry.clone());
    (world, registry)
}

fn behavior(world: &World, registry: &TypeRegistry, entity: Entity, name: &str) -> Behavior {
    mapping_behaviors(world, registry, entity)
        .into_iter()
        .find(|behavior| behavior.name == name)
        .unwrap()
}

fn snapshot(world: &World, registry: &TypeRegistry, entity: Entity, behavior: &Behavior) -> MappingView {
    let component = behavior.reflect.reflect(world.entity(entity)).unwrap();
    let map = behavior.fields[0].map(component).unwrap();
    let mut view = MappingView::default();
    view.snapshot(map, registry);
    view
}

fn write_back(
    world: &mut World,
    registry: &TypeRegistry,
    entity: Entity,
    behavior: &Behavior,
    view: &MappingView,
) {
    let mut entity = world.entity_mut(entity);
    let mut component = behavior.reflect.reflect_mut(&mut entity).unwrap();
    let map = behavior.fields[0].map_mut(&mut *component).unwrap();
    view.write_back(map, registry);
}

#[test]
fn adding_to_scores_inserts_a_default_entry() {
    let (mut world, registry) = setup();
    let registry = registry.read();
    let mut scores = Scores::default();
    scores.by_name.insert("alice".to_string(), 10);
    let entity = world.spawn(scores).id();

    let behavior = behavior(&world, &registry, entity, "Scores");
    assert_eq!(behavior.fields, [FieldPath::Named("by_name".to_string())]);

    let mut view = snapshot(&world, &registry, entity, &behavior);
    view.add_row(&mut CarrierMatcher::default(), &registry).unwrap();
    write_back(&mut world, &registry, entity, &behavior, &view);

    let scores = &world.get::<Scores>(entity).unwrap().by_name;
    assert_eq!(scores.len(), 2);
    assert_eq!(scores.get("alice"), Some(&10));
    assert_eq!(scores.get(""), Some(&0));
}

#[test]
fn a_second_add_collides_with_the_first() {
    let (mut world, registry) = setup();
    let registry = registry.read();
    let entity = world.spawn(Scores::default()).id();
    let behavior = behavior(&world, &registry, entity, "Scores");
    let mut matcher = CarrierMatcher::default();

    let mut view = snapshot(&world, &registry, entity, &behavior);
    view.add_row(&mut matcher, &registry).unwrap();
    write_back(&mut world, &registry, entity, &behavior, &view);

    let mut view = snapshot(&world, &registry, entity, &behavior);
    let error = view.add_row(&mut matcher, &registry).unwrap_err();
    assert!(matches!(error, MappingEditError::KeyCollision { .. }));
    assert_eq!(world.get::<Scores>(entity).unwrap().by_name.len(), 1);
}

#[test]
fn removing_a_row_removes_the_entry() {
    let (mut world, registry) = setup();
    let registry = registry.read();
    let mut scores = Scores::default();
    scores.by_name.insert("alice".to_string(), 10);
    scores.by_name.insert("bob".to_string(), 7);
    let entity = world.spawn(scores).id();
    let behavior = behavior(&world, &registry, entity, "Scores");

    let mut view = snapshot(&world, &registry, entity, &behavior);
    let index = view
        .rows()
        .iter()
        .position(|row| row.key.downcast_ref::<String>().map(String::as_str) == Some("bob"))
        .unwrap();
    view.remove_row(index);
    write_back(&mut world, &registry, entity, &behavior, &view);

    let scores = &world.get::<Scores>(entity).unwrap().by_name;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores.get("alice"), Some(&10));
}

#[test]
fn optional_values_default_to_none() {
    let (mut world, registry) = setup();
    let registry = registry.read();
    let waypoints = Waypoints(HashMap::from_iter([(1, Some(Vec3::X))]));
    let entity = world.spawn(waypoints).id();
    let behavior = behavior(&world, &registry, entity, "Waypoints");
    assert_eq!(behavior.fields, [FieldPath::Index(0)]);

    let mut view = snapshot(&world, &registry, entity, &behavior);
    view.add_row(&mut CarrierMatcher::default(), &registry).unwrap();
    write_back(&mut world, &registry, entity, &behavior, &view);

    let waypoints = &world.get::<Waypoints>(entity).unwrap().0;
    assert_eq!(waypoints.get(&0), Some(&None));
    assert_eq!(waypoints.get(&1), Some(&Some(Vec3::X)));
}

#[test]
fn bridged_edits_reach_the_component() {
    let (mut world, registry) = setup();
    let registry = registry.read();
    let waypoints = Waypoints(HashMap::from_iter([(1, Some(Vec3::X)), (2, None)]));
    let entity = world.spawn(waypoints).id();
    let behavior = behavior(&world, &registry, entity, "Waypoints");

    let mut view = snapshot(&world, &registry, entity, &behavior);
    let mut bridge = PropertyBridge::default();
    let index = view
        .rows()
        .iter()
        .position(|row| row.key.downcast_ref::<i32>() == Some(&1))
        .unwrap();

    let (key, value) = {
        let row = &view.rows()[index];
        (row.key.clone_value(), row.value.clone_value())
    };
    let Bridged::Editable(handle) = bridge.bridge(&*value) else {
        panic!("Some(Vec3) should be editable");
    };
    let mut edited = bridge.read_back(&handle, &*value).unwrap();
    edited.apply(&Some(Vec3::Y));
    view.replace_row(index, key, edited);
    write_back(&mut world, &registry, entity, &behavior, &view);

    let waypoints = &world.get::<Waypoints>(entity).unwrap().0;
    assert_eq!(waypoints.get(&1), Some(&Some(Vec3::Y)));
    assert_eq!(waypoints.get(&2), Some(&None));
}
