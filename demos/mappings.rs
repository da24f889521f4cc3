use aether_mapview::values::{Bounds, Gradient};
use aether_mapview::{InspectorSettings, MapViewPlugin, Selection};
use bevy::prelude::*;
use bevy::utils::HashMap;

fn main() {
    App::new()
        .register_type::<Inventory>()
        .register_type::<Waypoints>()
        .register_type::<Palette>()
        .register_type::<HashMap<String, i32>>()
        .register_type::<HashMap<i32, Option<Vec3>>>()
        .register_type::<HashMap<String, Gradient>>()
        .register_type::<HashMap<String, Bounds>>()
        .insert_resource(InspectorSettings {
            start_open: true,
            fields_open_by_default: true,
            ..default()
        })
        .add_plugins(DefaultPlugins)
        .add_plugins(MapViewPlugin)
        .add_systems(Startup, setup)
        .run();
}

#[derive(Component, Default, Reflect)]
#[reflect(Component, Default)]
struct Inventory {
    counts: HashMap<String, i32>,
    owner: String,
}

#[derive(Component, Default, Reflect)]
#[reflect(Component, Default)]
struct Waypoints(HashMap<i32, Option<Vec3>>);

#[derive(Component, Default, Reflect)]
#[reflect(Component, Default)]
struct Palette {
    gradients: HashMap<String, Gradient>,
    zones: HashMap<String, Bounds>,
}

fn setup(mut c: Commands, mut selection: ResMut<Selection>) {
    let chest = c
        .spawn((
            Name::new("Chest"),
            Inventory {
                counts: HashMap::from_iter([("apple".into(), 3), ("sword".into(), 1)]),
                owner: "nobody".into(),
            },
        ))
        .id();

    let path = c
        .spawn((
            Name::new("Patrol"),
            Waypoints(HashMap::from_iter([
                (0, Some(Vec3::ZERO)),
                (1, Some(Vec3::new(4.0, 0.0, 2.0))),
                (2, None),
            ])),
        ))
        .id();

    c.spawn((
        Name::new("Theme"),
        Palette {
            gradients: HashMap::from_iter([(
                "sunset".into(),
                Gradient::new(Color::ORANGE, Color::PURPLE),
            )]),
            zones: HashMap::from_iter([(
                "spawn".into(),
                Bounds::from_min_max(Vec3::ZERO, Vec3::splat(5.0)),
            )]),
        },
    ));

    c.spawn(Name::new("Empty"));

    selection.select(chest);
    selection.select(path);
}
