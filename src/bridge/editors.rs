//! The editors used to draw carrier fields.

use std::any::TypeId;
use std::fmt::Display;
use std::str::FromStr;

use bevy::prelude::*;
use bevy::reflect::{List, ReflectMut, ReflectRef, Tuple, TypeInfo};
use bevy::utils::HashMap;
use bevy_egui::egui::{self, Ui};

use super::carrier::CARRIER_SLOTS;

/// The state of an editor. These are stored in [`EditorStates`] by [`egui::Id`], which allows
/// editors to keep state between frames. Every row of a map view pushes its own id, so editors
/// drawn for different rows never share state even though they edit the same carrier field.
pub enum EditorState {
    /// Persistent state for a text editor. This prevents attempting to apply incomplete text
    /// immediately.
    TextEdit {
        /// The temporary string being typed/stored persistently.
        temp_value: String,
    },
}

impl EditorState {
    pub fn text_edit(&mut self) -> &mut String {
        match self {
            Self::TextEdit { temp_value } => temp_value,
        }
    }
}

/// Stores the state of editors.
#[derive(Default)]
pub struct EditorStates {
    state: HashMap<egui::Id, EditorState>,
}

impl EditorStates {
    /// Get the [`EditorState`] for a given id.
    pub fn get(&mut self, id: egui::Id) -> Option<&mut EditorState> {
        self.state.get_mut(&id)
    }

    /// Get the [`EditorState`] for a given id or use the default function given to create it.
    pub fn get_or(
        &mut self,
        id: egui::Id,
        default: impl FnOnce() -> EditorState,
    ) -> &mut EditorState {
        self.state.entry(id).or_insert_with(default)
    }

    /// Remove the state of an id.
    pub fn remove(&mut self, id: egui::Id) -> Option<EditorState> {
        self.state.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// An editor of a given type. Arguments:
/// - `ui: &mut Ui`
/// - `repr: &mut dyn Reflect`
/// - `editors: &ReprEditors`
/// - `states: &mut EditorStates`
///
/// Returns whether the value was edited this frame.
pub type ReprEditor =
    dyn Fn(&mut Ui, &mut dyn Reflect, &ReprEditors, &mut EditorStates) -> bool + Send + Sync;

/// A map from [`TypeId`]s to their [`ReprEditor`]. Types without an entry use a reflection based
/// editor.
pub struct ReprEditors {
    pub editors: HashMap<TypeId, Box<ReprEditor>>,
}

impl Default for ReprEditors {
    fn default() -> Self {
        Self {
            editors: <_>::from([
                (TypeId::of::<bool>(), Box::new(bool_editor) as Box<ReprEditor>),
                (TypeId::of::<i32>(), Box::new(num_editor::<i32>)),
                (TypeId::of::<f32>(), Box::new(num_editor::<f32>)),
                (TypeId::of::<f64>(), Box::new(num_editor::<f64>)),
                (TypeId::of::<String>(), Box::new(string_editor)),
                (TypeId::of::<Color>(), Box::new(color_editor)),
                (TypeId::of::<Entity>(), Box::new(entity_editor)),
            ]),
        }
    }
}

impl ReprEditors {
    const REFLECT_EDITOR: &ReprEditor = &|ui, repr, editors, states| match repr.reflect_mut() {
        ReflectMut::Struct(repr) => composite_editor(ui, repr, editors, states),
        ReflectMut::TupleStruct(repr) => composite_editor(ui, repr, editors, states),
        ReflectMut::Tuple(repr) => composite_editor(ui, repr, editors, states),
        ReflectMut::List(repr) => list_editor(ui, repr, editors, states),
        _ => {
            value_editor(ui, repr);
            false
        }
    };

    /// Get the editor for a type. Returns either a custom [`ReprEditor`] or the default
    /// reflection based one if none exists.
    pub fn get(&self, type_id: TypeId) -> &ReprEditor {
        self.editors
            .get(&type_id)
            .map(Box::as_ref)
            .unwrap_or(Self::REFLECT_EDITOR)
    }

    /// Add or replace the editor for `T`.
    pub fn insert<T: Reflect>(
        &mut self,
        editor: impl Fn(&mut Ui, &mut dyn Reflect, &ReprEditors, &mut EditorStates) -> bool
            + Send
            + Sync
            + 'static,
    ) {
        self.editors.insert(TypeId::of::<T>(), Box::new(editor));
    }

    fn edit(&self, ui: &mut Ui, repr: &mut dyn Reflect, states: &mut EditorStates) -> bool {
        let editor = self.get(repr.as_any().type_id());
        editor(ui, repr, self, states)
    }
}

/// Field access shared by structs, tuple structs and tuples.
pub trait FieldAccess {
    /// Get the number of fields.
    fn field_len(&self) -> usize;

    /// Get the nth field.
    fn field(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Get the name of the nth field.
    fn name(&self, index: usize) -> Option<&str>;

    /// Get the short type path of the implementor.
    fn short_type_path(&self) -> &str;
}

impl FieldAccess for &mut dyn Struct {
    fn field_len(&self) -> usize {
        Struct::field_len(*self)
    }

    fn field(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.field_at_mut(index)
    }

    fn name(&self, index: usize) -> Option<&str> {
        self.name_at(index)
    }

    fn short_type_path(&self) -> &str {
        self.reflect_short_type_path()
    }
}

impl FieldAccess for &mut dyn TupleStruct {
    fn field_len(&self) -> usize {
        TupleStruct::field_len(*self)
    }

    fn field(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.field_mut(index)
    }

    fn name(&self, _: usize) -> Option<&str> {
        None
    }

    fn short_type_path(&self) -> &str {
        self.reflect_short_type_path()
    }
}

impl FieldAccess for &mut dyn Tuple {
    fn field_len(&self) -> usize {
        Tuple::field_len(*self)
    }

    fn field(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.field_mut(index)
    }

    fn name(&self, _: usize) -> Option<&str> {
        None
    }

    fn short_type_path(&self) -> &str {
        self.reflect_short_type_path()
    }
}

/// An editor for structs, tuple structs and tuples. Small value-only composites such as vectors
/// are drawn on one line, anything nested gets a collapsing section.
pub fn composite_editor(
    ui: &mut Ui,
    mut repr: impl FieldAccess,
    editors: &ReprEditors,
    states: &mut EditorStates,
) -> bool {
    let inline = (0..repr.field_len()).all(|i| {
        repr.field(i)
            .is_some_and(|field| matches!(field.reflect_ref(), ReflectRef::Value(_)))
    });

    if inline {
        return ui
            .horizontal(|ui| {
                let mut changed = false;
                for i in 0..repr.field_len() {
                    changed |= field_editor(ui, &mut repr, i, editors, states);
                }
                changed
            })
            .inner;
    }

    let title = repr.short_type_path().to_string();
    ui.collapsing(title, |ui| {
        egui::Grid::new("fields")
            .num_columns(2)
            .show(ui, |ui| {
                let mut changed = false;
                for i in 0..repr.field_len() {
                    changed |= field_editor(ui, &mut repr, i, editors, states);
                    ui.end_row();
                }
                changed
            })
            .inner
    })
    .body_returned
    .unwrap_or(false)
}

fn field_editor(
    ui: &mut Ui,
    repr: &mut impl FieldAccess,
    index: usize,
    editors: &ReprEditors,
    states: &mut EditorStates,
) -> bool {
    let label = repr
        .name(index)
        .map(str::to_string)
        .unwrap_or_else(|| format!(".{index}"));
    let Some(field) = repr.field(index) else {
        return false;
    };
    ui.label(label);
    ui.push_id(index, |ui| editors.edit(ui, field, states)).inner
}

/// An editor for lists, with buttons to remove items and to append a default one.
pub fn list_editor(
    ui: &mut Ui,
    repr: &mut dyn List,
    editors: &ReprEditors,
    states: &mut EditorStates,
) -> bool {
    let title = format!("{} [{}]", repr.reflect_short_type_path(), repr.len());

    ui.collapsing(title, |ui| {
        let mut changed = false;
        let mut removed = None;
        for i in 0..repr.len() {
            let Some(item) = repr.get_mut(i) else { continue };
            ui.horizontal(|ui| {
                ui.label(format!("[{i}]"));
                changed |= ui.push_id(i, |ui| editors.edit(ui, item, states)).inner;
                if ui.small_button("-").clicked() {
                    removed = Some(i);
                }
            });
        }

        if let Some(i) = removed {
            repr.remove(i);
            changed = true;
        }

        if ui.small_button("+").clicked() {
            if let Some(item) = default_item(repr) {
                repr.push(item);
                changed = true;
            }
        }
        changed
    })
    .body_returned
    .unwrap_or(false)
}

fn default_item(repr: &dyn List) -> Option<Box<dyn Reflect>> {
    let item_type = match repr.get_represented_type_info() {
        Some(TypeInfo::List(info)) => Some(info.item_type_id()),
        _ => None,
    };

    item_type
        .and_then(|ty| CARRIER_SLOTS.iter().find(|slot| slot.type_id() == ty))
        .map(|slot| slot.default_value())
        .or_else(|| {
            let last = repr.get(repr.len().checked_sub(1)?)?;
            Some(last.clone_value())
        })
}

/// A default fallback editor for value types. Prints the debug representation of the value.
pub fn value_editor(ui: &mut Ui, repr: &mut dyn Reflect) {
    ui.weak(format!("{repr:?}"))
        .on_hover_text("No editor known for this value type.");
}

/// The bool editor.
pub fn bool_editor(
    ui: &mut Ui,
    repr: &mut dyn Reflect,
    _: &ReprEditors,
    _: &mut EditorStates,
) -> bool {
    let Some(value) = repr.downcast_mut::<bool>() else {
        return false;
    };
    ui.checkbox(value, "").changed()
}

/// A generic number editor that works for all integer + floating point types. Typed text is
/// only parsed and applied once the field loses focus.
pub fn num_editor<T: Copy + Reflect + FromStr + Display + PartialEq>(
    ui: &mut Ui,
    repr: &mut dyn Reflect,
    _: &ReprEditors,
    states: &mut EditorStates,
) -> bool {
    let Some(&value) = repr.downcast_ref::<T>() else {
        return false;
    };
    let text = states
        .get_or(ui.id(), || EditorState::TextEdit {
            temp_value: value.to_string(),
        })
        .text_edit();

    let edit = ui.add(egui::TextEdit::singleline(text).desired_width(64.0));
    let mut changed = false;
    if edit.lost_focus() {
        let parsed = text.parse::<T>().unwrap_or(value);
        states.remove(ui.id());
        if parsed != value {
            repr.apply(&parsed);
            changed = true;
        }
    }
    if !edit.has_focus() {
        states.remove(ui.id());
    }
    changed
}

/// The string editor.
pub fn string_editor(
    ui: &mut Ui,
    repr: &mut dyn Reflect,
    _: &ReprEditors,
    states: &mut EditorStates,
) -> bool {
    let Some(value) = repr.downcast_ref::<String>() else {
        return false;
    };
    let text = states
        .get_or(ui.id(), || EditorState::TextEdit {
            temp_value: value.clone(),
        })
        .text_edit();
    let edit = ui.text_edit_singleline(text);
    let mut changed = false;
    if edit.lost_focus() {
        if *text != *value {
            let text = text.clone();
            repr.apply(&text);
            changed = true;
        }
        states.remove(ui.id());
    }
    if !edit.has_focus() {
        states.remove(ui.id());
    }
    changed
}

/// The color editor, a color picker button working in unmultiplied sRGBA.
pub fn color_editor(
    ui: &mut Ui,
    repr: &mut dyn Reflect,
    _: &ReprEditors,
    _: &mut EditorStates,
) -> bool {
    let Some(color) = repr.downcast_mut::<Color>() else {
        return false;
    };
    let mut rgba = color.as_rgba_f32();
    let changed = ui.color_edit_button_rgba_unmultiplied(&mut rgba).changed();
    if changed {
        *color = Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
    }
    changed
}

/// The object reference editor. Edits the entity index, the generation is not editable.
pub fn entity_editor(
    ui: &mut Ui,
    repr: &mut dyn Reflect,
    _: &ReprEditors,
    _: &mut EditorStates,
) -> bool {
    let Some(entity) = repr.downcast_mut::<Entity>() else {
        return false;
    };
    if *entity == Entity::PLACEHOLDER {
        ui.weak("none");
        if ui.small_button("set").clicked() {
            *entity = Entity::from_raw(0);
            return true;
        }
        return false;
    }

    let mut index = entity.index();
    let changed = ui
        .add(egui::DragValue::new(&mut index).prefix("entity "))
        .changed();
    if changed {
        *entity = Entity::from_raw(index);
    }
    changed
}
