use bevy::prelude::*;

/// Settings for the map viewer window. Insert this resource before adding
/// [`MapViewPlugin`](crate::MapViewPlugin) to override the defaults.
#[derive(Resource, Reflect, Clone, Debug)]
#[reflect(Resource)]
pub struct InspectorSettings {
    /// Title of the window.
    pub title: String,
    /// Where the entry that opens the window sits in the menu bar, separated by `/`.
    pub menu_path: String,
    /// Whether to draw the menu bar at the top of the primary window.
    pub show_menu_bar: bool,
    /// Whether the window starts open.
    pub start_open: bool,
    /// Whether component sections start expanded.
    pub behaviors_open_by_default: bool,
    /// Whether map field sections start expanded.
    pub fields_open_by_default: bool,
    /// Fraction of a row's width given to the key, the value gets the rest.
    pub key_column_fraction: f32,
    /// Extra vertical space around each row.
    pub row_padding: f32,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            title: "Mapping Viewer".to_string(),
            menu_path: "Window/Mapping Viewer".to_string(),
            show_menu_bar: true,
            start_open: false,
            behaviors_open_by_default: true,
            fields_open_by_default: false,
            key_column_fraction: 0.5,
            row_padding: 2.0,
        }
    }
}

impl InspectorSettings {
    /// The menu path split into its non-empty segments.
    pub fn menu_segments(&self) -> Vec<&str> {
        self.menu_path
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_path_segments_skip_empty_parts() {
        let settings = InspectorSettings {
            menu_path: "/Window// Tools /Maps".to_string(),
            ..default()
        };
        assert_eq!(settings.menu_segments(), ["Window", "Tools", "Maps"]);
    }
}
