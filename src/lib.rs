pub mod bridge;
pub mod error;
pub mod popups;
pub mod selection;
pub mod settings;
pub mod tabs;
pub mod values;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::egui::{ScrollArea, Ui};
use bevy_egui::{egui, EguiContext, EguiPlugin};

pub use error::MappingEditError;
pub use selection::{Selection, SelectionChanged};
pub use settings::InspectorSettings;
pub use tabs::mappings::MappingState;

use popups::{display_popups, Popups};
use selection::{detect_selection_change, prune_selection};
use tabs::mappings::MappingsTab;
use tabs::selection::SelectionTab;

/// Adds the map viewer window, its menu entry and the resources it works with. Insert an
/// [`InspectorSettings`] before adding the plugin to change the defaults.
pub struct MapViewPlugin;

impl Plugin for MapViewPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<EguiPlugin>() {
            app.add_plugins(EguiPlugin);
        }

        app.init_resource::<InspectorSettings>()
            .init_resource::<Selection>()
            .init_resource::<Popups>()
            .init_resource::<MappingState>()
            .init_resource::<MapView>()
            .add_event::<SelectionChanged>()
            .register_type::<InspectorSettings>()
            .register_type::<values::IntRect>()
            .register_type::<values::Bounds>()
            .register_type::<values::IntBounds>()
            .register_type::<values::Keyframe>()
            .register_type::<values::Curve>()
            .register_type::<values::GradientStop>()
            .register_type::<values::Gradient>()
            .add_systems(
                Update,
                (
                    (
                        prune_selection,
                        detect_selection_change,
                        repaint_on_selection_change,
                        display_popups,
                        menu_bar,
                    )
                        .chain()
                        .before(MapViewWindow),
                    map_view_window.in_set(MapViewWindow),
                ),
            );
    }
}

pub trait Tab: Send + Sync {
    fn name(&self) -> &str;

    fn draw(&mut self, ui: &mut Ui, world: &mut World);
}

/// The map viewer window: its tabs, which one is shown and whether the window is open.
#[derive(Resource)]
pub struct MapView {
    pub tabs: Vec<Box<dyn Tab>>,
    selected: Option<usize>,
    open: bool,
}

impl FromWorld for MapView {
    fn from_world(world: &mut World) -> Self {
        let open = world
            .get_resource::<InspectorSettings>()
            .is_some_and(|settings| settings.start_open);
        Self {
            tabs: vec![
                Box::<SelectionTab>::default() as Box<dyn Tab>,
                Box::new(MappingsTab),
            ],
            selected: Some(1),
            open,
        }
    }
}

impl MapView {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// What the menu entry does.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn selected_tab(&self) -> Option<&str> {
        self.selected
            .and_then(|selected| self.tabs.get(selected))
            .map(|tab| tab.name())
    }

    /// Show the tab with the given name. Returns false if there is none.
    pub fn select_tab(&mut self, name: &str) -> bool {
        match self.tabs.iter().position(|tab| tab.name() == name) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, SystemSet)]
pub struct MapViewWindow;

fn repaint_on_selection_change(
    mut changed: EventReader<SelectionChanged>,
    mut contexts: Query<&mut EguiContext, With<PrimaryWindow>>,
) {
    if changed.read().count() == 0 {
        return;
    }
    debug!("selection changed, repainting the map viewer");
    if let Ok(mut ctx) = contexts.get_single_mut() {
        ctx.get_mut().request_repaint();
    }
}

/// Draw `entry` nested under `menus`. Returns true when the entry was clicked.
fn menu_entry(ui: &mut Ui, menus: &[&str], entry: &str) -> bool {
    match menus.split_first() {
        Some((menu, rest)) => ui
            .menu_button(*menu, |ui| menu_entry(ui, rest, entry))
            .inner
            .unwrap_or(false),
        None => {
            let clicked = ui.button(entry).clicked();
            if clicked {
                ui.close_menu();
            }
            clicked
        }
    }
}

fn menu_bar(
    settings: Res<InspectorSettings>,
    mut view: ResMut<MapView>,
    mut contexts: Query<&mut EguiContext, With<PrimaryWindow>>,
) {
    if !settings.show_menu_bar {
        return;
    }
    let segments = settings.menu_segments();
    let Some((entry, menus)) = segments.split_last() else {
        return;
    };
    let Ok(mut ctx) = contexts.get_single_mut() else {
        return;
    };

    egui::TopBottomPanel::top("map_view_menu_bar").show(ctx.get_mut(), |ui| {
        egui::menu::bar(ui, |ui| {
            if menu_entry(ui, menus, entry) {
                view.toggle();
            }
        });
    });
}

fn map_view_window(world: &mut World) {
    if let Some(mut state) = world.remove_resource::<MappingState>() {
        state.sweep(world);
        world.insert_resource(state);
    }

    if !world
        .get_resource::<MapView>()
        .is_some_and(|view| view.open)
    {
        return;
    }

    let Ok(primary_window) = world
        .query_filtered::<Entity, With<PrimaryWindow>>()
        .get_single(world)
    else {
        return;
    };

    let Some(mut ctx) = world.entity_mut(primary_window).take::<EguiContext>() else {
        return;
    };

    let Some(mut view) = world.remove_resource::<MapView>() else {
        world.entity_mut(primary_window).insert(ctx);
        return;
    };
    let title = world
        .get_resource::<InspectorSettings>()
        .map(|settings| settings.title.clone())
        .unwrap_or_else(|| InspectorSettings::default().title);

    let mut open = view.open;
    egui::Window::new(title)
        .open(&mut open)
        .show(ctx.get_mut(), |ui| {
            egui::menu::bar(ui, |ui| {
                let mut selected = view.selected;
                for (i, tab) in view.tabs.iter().enumerate() {
                    if ui
                        .selectable_label(selected == Some(i), tab.name())
                        .clicked()
                    {
                        selected = if selected == Some(i) { None } else { Some(i) };
                    }
                }
                view.selected = selected;
            });

            ui.separator();

            match view.selected {
                Some(selected) => {
                    let Some(tab) = view.tabs.get_mut(selected) else {
                        view.selected = None;
                        return;
                    };

                    ScrollArea::new([true, true]).show(ui, |ui| {
                        tab.draw(ui, world);
                    });
                }
                None => {
                    ui.heading("Please select a tab.");
                }
            }
        });
    view.open = open;

    world.insert_resource(view);
    world.entity_mut(primary_window).insert(ctx);
}
