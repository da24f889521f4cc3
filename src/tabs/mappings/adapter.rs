//! Edits a live map through a list of `(key, value)` rows.
//!
//! Every frame the rows are rebuilt from the map ([`MappingView::snapshot`]), drawn, and if
//! anything was edited the whole map is rebuilt from the rows ([`MappingView::write_back`]). The
//! rows are never the source of truth, the map is.

use std::any::TypeId;

use bevy::prelude::*;
use bevy::reflect::{
    DynamicEnum, DynamicVariant, Map, ReflectFromReflect, TypeInfo, TypeRegistry,
};
use bevy::utils::hashbrown::hash_map::Entry;
use bevy::utils::HashMap;
use bevy_egui::egui::{self, Ui};

use crate::bridge::matcher::CarrierMatcher;
use crate::bridge::{reflected_type_id, unwrap_option, Bridged, PropertyBridge};
use crate::error::MappingEditError;

use super::list::{self, ListDelegate, ReorderableList};

/// Identifies a row across frames. A row keeps its id for as long as its key stays in the map,
/// including when it moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

pub struct Row {
    pub id: RowId,
    pub key: Box<dyn Reflect>,
    pub value: Box<dyn Reflect>,
}

/// Which half of a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Key,
    Value,
}

struct CachedProperty {
    source: Box<dyn Reflect>,
    bridged: Bridged,
}

/// Bridge results per row, reused while the row's key or value stays equal to what was bridged.
#[derive(Default)]
pub struct RowCache {
    properties: HashMap<(RowId, Side), CachedProperty>,
    misses: usize,
}

impl RowCache {
    /// The bridge result for one side of a row, bridging again if the value changed.
    pub fn bridged(
        &mut self,
        id: RowId,
        side: Side,
        value: &dyn Reflect,
        bridge: &mut PropertyBridge,
    ) -> &mut Bridged {
        match self.properties.entry((id, side)) {
            Entry::Occupied(entry) if entry.get().source.reflect_partial_eq(value) == Some(true) => {
                &mut entry.into_mut().bridged
            }
            entry => {
                self.misses += 1;
                let cached = CachedProperty {
                    source: value.clone_value(),
                    bridged: bridge.bridge(value),
                };
                match entry {
                    Entry::Occupied(mut entry) => {
                        entry.insert(cached);
                        &mut entry.into_mut().bridged
                    }
                    Entry::Vacant(entry) => &mut entry.insert(cached).bridged,
                }
            }
        }
    }

    pub fn peek(&self, id: RowId, side: Side) -> Option<&Bridged> {
        self.properties.get(&(id, side)).map(|cached| &cached.bridged)
    }

    /// How many times a value had to be bridged because it was missing or stale.
    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Drop entries for rows that are gone.
    pub fn retain_rows(&mut self, rows: &[Row]) {
        self.properties
            .retain(|(id, _), _| rows.iter().any(|row| row.id == *id));
    }
}

/// The list view of one map field.
#[derive(Default)]
pub struct MappingView {
    rows: Vec<Row>,
    next_id: u64,
    key_type: Option<TypeId>,
    value_type: Option<TypeId>,
    key_path: Option<String>,
    value_path: Option<String>,
    list: ReorderableList,
    cache: RowCache,
}

/// Copy a reflected value, keeping it concrete when the registry knows how.
fn concrete(value: &dyn Reflect, registry: &TypeRegistry) -> Box<dyn Reflect> {
    registry
        .get_type_data::<ReflectFromReflect>(reflected_type_id(value))
        .and_then(|from| from.from_reflect(value))
        .unwrap_or_else(|| value.clone_value())
}

fn type_name(type_id: Option<TypeId>, path: Option<&str>, registry: &TypeRegistry) -> String {
    path.map(str::to_string)
        .or_else(|| {
            type_id
                .and_then(|ty| registry.get_type_info(ty))
                .map(|info| info.type_path().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// The default for one side of a new row. Options the registry has never seen still default to
/// an unrepresented `None`, which any `Option<T>` map accepts on insert.
fn default_value(
    matcher: &mut CarrierMatcher,
    type_id: Option<TypeId>,
    path: Option<&str>,
    registry: &TypeRegistry,
) -> Option<Box<dyn Reflect>> {
    type_id
        .and_then(|ty| matcher.default_for(ty, registry))
        .or_else(|| {
            path.filter(|path| path.starts_with("core::option::Option<"))
                .map(|_| {
                    Box::new(DynamicEnum::new("None", DynamicVariant::Unit)) as Box<dyn Reflect>
                })
        })
}

impl MappingView {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cache(&self) -> &RowCache {
        &self.cache
    }

    fn fresh_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId(self.next_id)
    }

    /// Rebuild the rows from the live map, in the map's own iteration order. Rows whose key was
    /// already in the previous snapshot keep their id.
    pub fn snapshot(&mut self, map: &dyn Map, registry: &TypeRegistry) {
        if let Some(TypeInfo::Map(info)) = map.get_represented_type_info() {
            self.key_type = Some(info.key_type_id());
            self.value_type = Some(info.value_type_id());
            self.key_path = Some(info.key_type_path_table().path().to_string());
            self.value_path = Some(info.value_type_path_table().path().to_string());
        }

        let previous = std::mem::take(&mut self.rows);
        for (key, value) in map.iter() {
            let id = previous
                .iter()
                .find(|row| row.key.reflect_partial_eq(key) == Some(true))
                .map(|row| row.id)
                .unwrap_or_else(|| self.fresh_id());
            self.rows.push(Row {
                id,
                key: concrete(key, registry),
                value: concrete(value, registry),
            });
        }
        self.cache.retain_rows(&self.rows);
    }

    /// Rebuild the live map from the rows. Every entry is removed and the rows are inserted in
    /// order, so later rows win over earlier rows with the same key.
    pub fn write_back(&self, map: &mut dyn Map, registry: &TypeRegistry) {
        let keys = map
            .iter()
            .map(|(key, _)| key.clone_value())
            .collect::<Vec<_>>();
        // Back to front, so maps that keep entries in a vec never shift the ones left to remove.
        for key in keys.iter().rev() {
            map.remove(&**key);
        }
        for row in &self.rows {
            map.insert_boxed(concrete(&*row.key, registry), concrete(&*row.value, registry));
        }
    }

    /// Append a row with a default key and value. The types come from the map's declared key and
    /// value types, or from the first rows that are not `None` if the map does not declare any.
    /// Option values default to `None` even when the option type itself is not registered.
    /// The caller is expected to write back afterwards.
    pub fn add_row(
        &mut self,
        matcher: &mut CarrierMatcher,
        registry: &TypeRegistry,
    ) -> Result<RowId, MappingEditError> {
        let present_type = |value: &dyn Reflect| {
            unwrap_option(value).map(|_| reflected_type_id(value))
        };
        let key_type = self
            .key_type
            .or_else(|| self.rows.iter().find_map(|row| present_type(&*row.key)));
        let value_type = self
            .value_type
            .or_else(|| self.rows.iter().find_map(|row| present_type(&*row.value)));

        let (key_path, value_path) = (self.key_path.as_deref(), self.value_path.as_deref());

        let key = default_value(matcher, key_type, key_path, registry).ok_or_else(|| {
            MappingEditError::NoDefault {
                role: "key",
                type_name: type_name(key_type, key_path, registry),
            }
        })?;
        let value = default_value(matcher, value_type, value_path, registry).ok_or_else(|| {
            MappingEditError::NoDefault {
                role: "value",
                type_name: type_name(value_type, value_path, registry),
            }
        })?;

        if self
            .rows
            .iter()
            .any(|row| row.key.reflect_partial_eq(&*key) == Some(true))
        {
            return Err(MappingEditError::KeyCollision {
                key: format!("{key:?}"),
            });
        }

        let id = self.fresh_id();
        self.rows.push(Row { id, key, value });
        Ok(id)
    }

    pub fn remove_row(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn move_row(&mut self, from: usize, to: usize) {
        list::move_item(&mut self.rows, from, to);
    }

    /// Replace a row's key and value, keeping its id.
    pub fn replace_row(&mut self, index: usize, key: Box<dyn Reflect>, value: Box<dyn Reflect>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.key = key;
            row.value = value;
        }
    }
}

/// Layout options for drawing a view.
pub struct ViewStyle<'a> {
    pub title: &'a str,
    pub key_fraction: f32,
    pub row_padding: f32,
}

/// What happened while drawing a view.
#[derive(Default)]
pub struct ViewOutcome {
    /// The rows changed and the map must be rebuilt from them.
    pub write_back: bool,
    pub error: Option<MappingEditError>,
}

struct RowDelegate<'a> {
    bridge: &'a mut PropertyBridge,
    cache: &'a mut RowCache,
    style: &'a ViewStyle<'a>,
    line_height: f32,
    edited: bool,
    add_requested: bool,
}

impl ListDelegate<Row> for RowDelegate<'_> {
    fn draw_header(&mut self, ui: &mut Ui) {
        ui.strong(self.style.title);
    }

    fn draw_element(&mut self, ui: &mut Ui, _: usize, row: &mut Row) {
        let width = ui.available_width();
        let key_width = width * self.style.key_fraction.clamp(0.1, 0.9);

        let (key, value) = ui
            .horizontal(|ui| {
                let key = ui
                    .allocate_ui(egui::vec2(key_width, self.line_height), |ui| {
                        ui.push_id((row.id, Side::Key), |ui| {
                            let bridged = self.cache.bridged(row.id, Side::Key, &*row.key, self.bridge);
                            self.bridge.show(ui, bridged, &*row.key)
                        })
                        .inner
                    })
                    .inner;
                let value = ui
                    .allocate_ui(egui::vec2(width - key_width, self.line_height), |ui| {
                        ui.push_id((row.id, Side::Value), |ui| {
                            let bridged =
                                self.cache.bridged(row.id, Side::Value, &*row.value, self.bridge);
                            self.bridge.show(ui, bridged, &*row.value)
                        })
                        .inner
                    })
                    .inner;
                (key, value)
            })
            .inner;

        if key.is_some() || value.is_some() {
            if let Some(key) = key {
                row.key = key;
            }
            if let Some(value) = value {
                row.value = value;
            }
            self.edited = true;
        }
    }

    fn item_id(&self, _: usize, row: &Row) -> egui::Id {
        egui::Id::new(row.id)
    }

    fn element_height(&mut self, _: usize, row: &Row) -> f32 {
        let key_handle = self
            .cache
            .peek(row.id, Side::Key)
            .and_then(Bridged::handle)
            .cloned();
        let value_handle = self
            .cache
            .peek(row.id, Side::Value)
            .and_then(Bridged::handle)
            .cloned();
        let key = self
            .bridge
            .height_of(&*row.key, key_handle.as_ref(), self.line_height);
        let value = self
            .bridge
            .height_of(&*row.value, value_handle.as_ref(), self.line_height);
        key.max(value) + self.style.row_padding
    }

    fn on_add(&mut self, _: &mut Vec<Row>) {
        self.add_requested = true;
    }

    fn on_remove(&mut self, items: &mut Vec<Row>, index: usize) {
        list::remove_selected(items, index);
        self.edited = true;
    }

    fn on_reorder(&mut self, _: &mut Vec<Row>) {
        self.edited = true;
    }
}

/// Draw a view as a reorderable list. The view must have been snapshotted this frame.
pub fn draw_view(
    ui: &mut Ui,
    id_source: impl std::hash::Hash,
    view: &mut MappingView,
    bridge: &mut PropertyBridge,
    registry: &TypeRegistry,
    style: &ViewStyle,
) -> ViewOutcome {
    let mut delegate = RowDelegate {
        bridge: &mut *bridge,
        cache: &mut view.cache,
        style,
        line_height: ui.spacing().interact_size.y,
        edited: false,
        add_requested: false,
    };
    view.list.show(ui, id_source, &mut view.rows, &mut delegate);
    let (edited, add_requested) = (delegate.edited, delegate.add_requested);

    let mut outcome = ViewOutcome {
        write_back: edited,
        error: None,
    };
    if add_requested {
        match view.add_row(bridge.matcher_mut(), registry) {
            Ok(_) => outcome.write_back = true,
            Err(error) => {
                warn!("could not add a row to {}: {error}", style.title);
                outcome.error = Some(error);
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use bevy::reflect::DynamicMap;
    use bevy::utils::HashMap;

    use super::*;

    fn string_key(row: &Row) -> &str {
        row.key.downcast_ref::<String>().unwrap()
    }

    fn ordered(entries: &[(&str, i32)]) -> DynamicMap {
        let mut map = DynamicMap::default();
        for (key, value) in entries {
            map.insert(key.to_string(), *value);
        }
        map
    }

    fn entries(map: &dyn Map) -> Vec<(String, i32)> {
        map.iter()
            .map(|(key, value)| {
                (
                    key.downcast_ref::<String>().unwrap().clone(),
                    *value.downcast_ref::<i32>().unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn snapshot_follows_map_order() {
        let registry = TypeRegistry::default();
        let map = ordered(&[("c", 3), ("a", 1), ("b", 2)]);
        let mut view = MappingView::default();
        view.snapshot(&map, &registry);
        let keys = view.rows().iter().map(string_key).collect::<Vec<_>>();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn row_ids_survive_reorders() {
        let registry = TypeRegistry::default();
        let mut map = ordered(&[("a", 1), ("b", 2), ("c", 3)]);
        let mut view = MappingView::default();
        view.snapshot(&map, &registry);
        let id_of_a = view.rows()[0].id;

        view.move_row(0, 2);
        view.write_back(&mut map, &registry);
        view.snapshot(&map, &registry);

        assert_eq!(view.rows()[2].id, id_of_a);
        assert_eq!(string_key(&view.rows()[2]), "a");
    }

    #[test]
    fn reorder_writes_back_in_view_order() {
        let registry = TypeRegistry::default();
        let mut map = ordered(&[("a", 1), ("b", 2), ("c", 3)]);
        let mut view = MappingView::default();
        view.snapshot(&map, &registry);
        view.move_row(0, 2);
        view.write_back(&mut map, &registry);
        assert_eq!(
            entries(&map),
            [("b".to_string(), 2), ("c".to_string(), 3), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn duplicate_keys_collapse_to_the_last_row() {
        let registry = TypeRegistry::default();
        let mut map = ordered(&[("a", 1), ("b", 2)]);
        let mut view = MappingView::default();
        view.snapshot(&map, &registry);
        view.replace_row(1, Box::new("a".to_string()), Box::new(9i32));
        view.write_back(&mut map, &registry);
        assert_eq!(entries(&map), [("a".to_string(), 9)]);
    }

    #[test]
    fn remove_leaves_the_other_keys() {
        let registry = TypeRegistry::default();
        let mut map = ordered(&[("a", 1), ("b", 2), ("c", 3)]);
        let mut view = MappingView::default();
        view.snapshot(&map, &registry);
        assert!(view.remove_row(1).is_some());
        assert!(view.remove_row(7).is_none());
        view.write_back(&mut map, &registry);
        assert_eq!(entries(&map), [("a".to_string(), 1), ("c".to_string(), 3)]);
    }

    #[test]
    fn repeated_adds_keep_insertion_order() {
        let registry = TypeRegistry::default();
        let mut matcher = CarrierMatcher::default();
        let mut map = DynamicMap::default();
        let mut view = MappingView::default();

        // An empty dynamic map declares no types, so seed one row to infer them from.
        map.insert("first".to_string(), 1i32);
        for i in 0..4 {
            view.snapshot(&map, &registry);
            view.add_row(&mut matcher, &registry).unwrap();
            let last = view.rows().len() - 1;
            view.replace_row(last, Box::new(format!("key{i}")), Box::new(i as i32));
            view.write_back(&mut map, &registry);
        }

        let keys = entries(&map)
            .into_iter()
            .map(|(key, _)| key)
            .collect::<Vec<_>>();
        assert_eq!(keys, ["first", "key0", "key1", "key2", "key3"]);
    }

    #[test]
    fn add_uses_declared_types() {
        let registry = TypeRegistry::default();
        let mut matcher = CarrierMatcher::default();
        let mut scores = HashMap::<String, i32>::default();
        scores.insert("alice".to_string(), 10);

        let mut view = MappingView::default();
        view.snapshot(&scores, &registry);
        view.add_row(&mut matcher, &registry).unwrap();
        view.write_back(&mut scores, &registry);

        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get(""), Some(&0));
        assert_eq!(scores.get("alice"), Some(&10));
    }

    #[test]
    fn add_refuses_to_overwrite_a_default_key() {
        let registry = TypeRegistry::default();
        let mut matcher = CarrierMatcher::default();
        let mut scores = HashMap::<String, i32>::default();
        scores.insert(String::new(), 4);

        let mut view = MappingView::default();
        view.snapshot(&scores, &registry);
        let error = view.add_row(&mut matcher, &registry).unwrap_err();
        assert!(matches!(error, MappingEditError::KeyCollision { .. }));
        assert_eq!(view.rows().len(), 1);
    }

    #[test]
    fn add_without_any_type_fails() {
        let registry = TypeRegistry::default();
        let mut matcher = CarrierMatcher::default();
        let mut view = MappingView::default();
        view.snapshot(&DynamicMap::default(), &registry);
        let error = view.add_row(&mut matcher, &registry).unwrap_err();
        assert_eq!(
            error,
            MappingEditError::NoDefault {
                role: "key",
                type_name: "unknown".to_string()
            }
        );
    }

    #[test]
    fn unregistered_options_default_to_none() {
        let registry = TypeRegistry::default();
        let mut matcher = CarrierMatcher::default();
        let mut waypoints = HashMap::<i32, Option<Vec3>>::default();
        waypoints.insert(1, Some(Vec3::X));

        let mut view = MappingView::default();
        view.snapshot(&waypoints, &registry);
        view.add_row(&mut matcher, &registry).unwrap();
        view.write_back(&mut waypoints, &registry);

        assert_eq!(waypoints.get(&0), Some(&None));
        assert_eq!(waypoints.get(&1), Some(&Some(Vec3::X)));
    }

    #[derive(Reflect, Clone, Debug, PartialEq)]
    struct Marker(u8);

    #[test]
    fn missing_defaults_name_the_declared_type() {
        let registry = TypeRegistry::default();
        let mut matcher = CarrierMatcher::default();
        let mut markers = HashMap::<i32, Marker>::default();
        markers.insert(1, Marker(3));

        let mut view = MappingView::default();
        view.snapshot(&markers, &registry);
        let error = view.add_row(&mut matcher, &registry).unwrap_err();
        assert_eq!(
            error,
            MappingEditError::NoDefault {
                role: "value",
                type_name: <Marker as TypePath>::type_path().to_string(),
            }
        );
        assert_eq!(view.rows().len(), 1);
    }

    #[test]
    fn cache_reuses_unchanged_values() {
        let registry = TypeRegistry::default();
        let mut bridge = PropertyBridge::default();
        let mut map = ordered(&[("a", 1)]);
        let mut view = MappingView::default();

        view.snapshot(&map, &registry);
        let row = &view.rows[0];
        view.cache.bridged(row.id, Side::Value, &*row.value, &mut bridge);
        view.cache.bridged(row.id, Side::Value, &*row.value, &mut bridge);
        assert_eq!(view.cache.misses(), 1);

        view.replace_row(0, Box::new("a".to_string()), Box::new(2i32));
        view.write_back(&mut map, &registry);
        view.snapshot(&map, &registry);
        let row = &view.rows[0];
        view.cache.bridged(row.id, Side::Value, &*row.value, &mut bridge);
        assert_eq!(view.cache.misses(), 2);
    }

    #[test]
    fn cache_drops_removed_rows() {
        let registry = TypeRegistry::default();
        let mut bridge = PropertyBridge::default();
        let mut map = ordered(&[("a", 1), ("b", 2)]);
        let mut view = MappingView::default();

        view.snapshot(&map, &registry);
        for row in &view.rows {
            view.cache.bridged(row.id, Side::Key, &*row.key, &mut bridge);
        }
        assert_eq!(view.cache.len(), 2);

        view.remove_row(0);
        view.write_back(&mut map, &registry);
        view.snapshot(&map, &registry);
        assert_eq!(view.cache.len(), 1);
    }

    #[test]
    fn drawing_without_input_leaves_the_map_alone() {
        let registry = TypeRegistry::default();
        let mut bridge = PropertyBridge::default();
        let map = ordered(&[("a", 1), ("b", 2)]);
        let mut view = MappingView::default();
        let style = ViewStyle {
            title: "scores",
            key_fraction: 0.5,
            row_padding: 2.0,
        };

        let ctx = egui::Context::default();
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    view.snapshot(&map, &registry);
                    let outcome = draw_view(ui, "scores", &mut view, &mut bridge, &registry, &style);
                    assert!(!outcome.write_back);
                    assert!(outcome.error.is_none());
                });
            });
        }
        // Two rows, key and value each, bridged once and reused on the second frame.
        assert_eq!(view.cache().misses(), 4);
    }

    #[test]
    fn editor_changes_are_written_back() {
        let registry = TypeRegistry::default();
        let mut bridge = PropertyBridge::default();
        bridge.editors_mut().insert::<i32>(|_, repr, _, _| {
            repr.apply(&42i32);
            true
        });
        let mut map = ordered(&[("a", 1), ("b", 2)]);
        let mut view = MappingView::default();
        let style = ViewStyle {
            title: "scores",
            key_fraction: 0.5,
            row_padding: 2.0,
        };

        let ctx = egui::Context::default();
        let mut write_back = false;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                view.snapshot(&map, &registry);
                let outcome = draw_view(ui, "scores", &mut view, &mut bridge, &registry, &style);
                assert!(outcome.error.is_none());
                write_back = outcome.write_back;
            });
        });

        assert!(write_back);
        view.write_back(&mut map, &registry);
        assert_eq!(entries(&map), [("a".to_string(), 42), ("b".to_string(), 42)]);
    }
}
