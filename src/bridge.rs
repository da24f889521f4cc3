//! The property bridge. Turns a reflected value of any type into something the typed editors can
//! draw, by copying it into the matching field of the [`Carrier`] and copying edits back out.

pub mod carrier;
pub mod editors;
pub mod matcher;

use std::any::TypeId;

use bevy::prelude::*;
use bevy::reflect::{DynamicEnum, DynamicTuple, DynamicVariant, Enum, ReflectRef};
use bevy_egui::egui::Ui;

use self::carrier::Carrier;
use self::editors::{EditorStates, ReprEditors};
use self::matcher::{Binding, CarrierMatcher};

/// A value that has been routed into a carrier slot.
#[derive(Clone, Debug)]
pub struct EditableHandle {
    binding: Binding,
    /// Whether the bridged value is the content of a `Some`.
    wrapped: bool,
    height: f32,
}

impl EditableHandle {
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// The height of the control the last time it was drawn, or zero if it never was.
    pub fn measured_height(&self) -> f32 {
        self.height
    }
}

/// The result of bridging a value.
#[derive(Clone, Debug)]
pub enum Bridged {
    /// The value is `None`. Drawn as a `null` label.
    Null,
    /// No carrier slot accepts the value. Drawn as its debug representation.
    ReadOnly(String),
    Editable(EditableHandle),
}

impl Bridged {
    pub fn handle(&self) -> Option<&EditableHandle> {
        match self {
            Bridged::Editable(handle) => Some(handle),
            _ => None,
        }
    }
}

/// The type a reflected value stands for. Dynamic values report the type they represent.
pub fn reflected_type_id(value: &dyn Reflect) -> TypeId {
    value
        .get_represented_type_info()
        .map(|info| info.type_id())
        .unwrap_or_else(|| value.as_any().type_id())
}

fn is_option(value: &dyn Enum) -> bool {
    match value.get_represented_type_info() {
        Some(info) => info.type_path().starts_with("core::option::Option<"),
        None => match value.variant_name() {
            "None" => value.field_len() == 0,
            "Some" => value.field_len() == 1,
            _ => false,
        },
    }
}

/// Look through an option. Returns `None` for absent values, and whether the returned value was
/// inside a `Some`.
pub fn unwrap_option(value: &dyn Reflect) -> Option<(&dyn Reflect, bool)> {
    let ReflectRef::Enum(option) = value.reflect_ref() else {
        return Some((value, false));
    };
    if !is_option(option) {
        return Some((value, false));
    }
    match option.variant_name() {
        "Some" => option.field_at(0).map(|inner| (inner, true)),
        _ => None,
    }
}

fn wrap_some(value: Box<dyn Reflect>, like: &dyn Reflect) -> Box<dyn Reflect> {
    let mut tuple = DynamicTuple::default();
    tuple.insert_boxed(value);
    let mut some = DynamicEnum::new("Some", DynamicVariant::Tuple(tuple));
    some.set_represented_type(like.get_represented_type_info());
    Box::new(some)
}

/// Owns the carrier, the matcher and the editors. One of these exists per inspector window, and
/// it is only ever used from that window's draw.
#[derive(Default)]
pub struct PropertyBridge {
    carrier: Carrier,
    matcher: CarrierMatcher,
    editors: ReprEditors,
    states: EditorStates,
}

impl PropertyBridge {
    pub fn matcher(&self) -> &CarrierMatcher {
        &self.matcher
    }

    /// Use this to register subtypes.
    pub fn matcher_mut(&mut self) -> &mut CarrierMatcher {
        &mut self.matcher
    }

    /// Use this to add custom editors.
    pub fn editors_mut(&mut self) -> &mut ReprEditors {
        &mut self.editors
    }

    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    /// Route a value into its carrier slot.
    pub fn bridge(&mut self, value: &dyn Reflect) -> Bridged {
        let Some((inner, wrapped)) = unwrap_option(value) else {
            return Bridged::Null;
        };
        let Some(binding) = self.matcher.resolve(reflected_type_id(inner)) else {
            return Bridged::ReadOnly(format!("{inner:?}"));
        };
        if !self.load(&binding, inner) {
            return Bridged::ReadOnly(format!("{inner:?}"));
        }

        Bridged::Editable(EditableHandle {
            binding,
            wrapped,
            height: 0.0,
        })
    }

    fn load(&mut self, binding: &Binding, value: &dyn Reflect) -> bool {
        let Some(value) = self.matcher.upcast(binding, value) else {
            warn!(
                "could not convert {} into carrier slot `{}`",
                value.reflect_type_path(),
                binding.carrier_slot().name
            );
            return false;
        };
        let Some(slot) = self.carrier.slot_mut(binding.slot) else {
            return false;
        };
        slot.set(value).is_ok()
    }

    /// The current value of the handle's carrier slot, converted back to the bridged type.
    pub fn read_back(&self, handle: &EditableHandle, like: &dyn Reflect) -> Option<Box<dyn Reflect>> {
        let slot = self.carrier.slot(handle.binding.slot)?;
        let value = self.matcher.downcast(&handle.binding, slot)?;
        Some(match handle.wrapped {
            true => wrap_some(value, like),
            false => value,
        })
    }

    /// Draw the editor for a bridged value. The value is reloaded into the carrier first, since
    /// every row shares it. Returns the edited value if the editor changed it.
    pub fn render(
        &mut self,
        ui: &mut Ui,
        handle: &mut EditableHandle,
        value: &dyn Reflect,
    ) -> Option<Box<dyn Reflect>> {
        let (inner, _) = unwrap_option(value)?;
        if !self.load(&handle.binding, inner) {
            return None;
        }

        let slot_type = handle.binding.carrier_slot().type_id();
        let editor = self.editors.get(slot_type);
        let field = self.carrier.slot_mut(handle.binding.slot)?;
        let response = ui.scope(|ui| editor(ui, field, &self.editors, &mut self.states));
        handle.height = response.response.rect.height();

        if response.inner {
            self.read_back(handle, value)
        } else {
            None
        }
    }

    /// Draw any bridged value: editors for editable ones, labels for the rest.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        bridged: &mut Bridged,
        value: &dyn Reflect,
    ) -> Option<Box<dyn Reflect>> {
        match bridged {
            Bridged::Null => {
                ui.label("null");
                None
            }
            Bridged::ReadOnly(text) => {
                ui.weak(text.as_str());
                None
            }
            Bridged::Editable(handle) => self.render(ui, handle, value),
        }
    }

    /// The height needed to draw a value, at least one line. Uses the given handle if there is
    /// one, otherwise bridges the value.
    pub fn height_of(
        &mut self,
        value: &dyn Reflect,
        handle: Option<&EditableHandle>,
        line_height: f32,
    ) -> f32 {
        let measured = match handle {
            Some(handle) => handle.height,
            None => match self.bridge(value) {
                Bridged::Editable(handle) => handle.height,
                _ => 0.0,
            },
        };
        measured.max(line_height)
    }
}
