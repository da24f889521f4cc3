//! The carrier: a reflected struct with one field per kind of value that has a native editor.
//! Arbitrary map keys and values are copied into the matching field so the typed editor for that
//! field can draw them, then copied back out.

use std::any::TypeId;
use std::collections::VecDeque;

use bevy::prelude::*;
use bevy::reflect::TypePath;

use crate::values::{Bounds, Curve, Gradient, IntBounds, IntRect};

/// One field of the [`Carrier`]. The position of a slot in [`CARRIER_SLOTS`] is the index of its
/// field in the carrier, and also its matching priority.
pub struct CarrierSlot {
    /// The name of the carrier field.
    pub name: &'static str,
    type_id: fn() -> TypeId,
    type_path: fn() -> &'static str,
    default: fn() -> Box<dyn Reflect>,
    from_reflect: fn(&dyn Reflect) -> Option<Box<dyn Reflect>>,
}

impl CarrierSlot {
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn type_path(&self) -> &'static str {
        (self.type_path)()
    }

    /// A zero value of the slot type. Strings are empty, numbers and vectors are zero, colors are
    /// transparent and object references are [`Entity::PLACEHOLDER`].
    pub fn default_value(&self) -> Box<dyn Reflect> {
        (self.default)()
    }

    /// Convert any reflected representation of the slot type (including dynamic ones) into a
    /// boxed value of the concrete slot type.
    pub fn from_reflect(&self, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
        (self.from_reflect)(value)
    }
}

fn boxed_from_reflect<T: FromReflect>(value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
    T::from_reflect(value).map(|value| Box::new(value) as Box<dyn Reflect>)
}

macro_rules! carrier {
    ($($field:ident: $ty:ty = $default:expr,)*) => {
        /// Scratch storage for the value currently being edited. Only one of these should be
        /// alive per inspector window, and its fields hold nothing meaningful between edits.
        #[derive(Reflect, Clone, Debug)]
        pub struct Carrier {
            $(pub $field: $ty,)*
        }

        impl Default for Carrier {
            fn default() -> Self {
                Self {
                    $($field: $default,)*
                }
            }
        }

        /// Every carrier field in declaration order.
        pub static CARRIER_SLOTS: &[CarrierSlot] = &[
            $(CarrierSlot {
                name: stringify!($field),
                type_id: TypeId::of::<$ty>,
                type_path: <$ty as TypePath>::type_path,
                default: || -> Box<dyn Reflect> {
                    let value: $ty = $default;
                    Box::new(value)
                },
                from_reflect: boxed_from_reflect::<$ty>,
            },)*
        ];
    };
}

carrier! {
    i: i32 = 0,
    f: f32 = 0.0,
    d: f64 = 0.0,
    s: String = String::new(),
    b: bool = false,
    color: Color = Color::NONE,
    object: Entity = Entity::PLACEHOLDER,
    curve: Curve = Curve::default(),
    gradient: Gradient = Gradient::default(),
    vec2: Vec2 = Vec2::ZERO,
    vec3: Vec3 = Vec3::ZERO,
    vec4: Vec4 = Vec4::ZERO,
    ivec2: IVec2 = IVec2::ZERO,
    ivec3: IVec3 = IVec3::ZERO,
    rect: Rect = Rect::default(),
    int_rect: IntRect = IntRect::default(),
    bounds: Bounds = Bounds::default(),
    int_bounds: IntBounds = IntBounds::default(),

    arr_i: Vec<i32> = Vec::new(),
    arr_f: Vec<f32> = Vec::new(),
    arr_d: Vec<f64> = Vec::new(),
    arr_s: Vec<String> = Vec::new(),
    arr_b: Vec<bool> = Vec::new(),
    arr_color: Vec<Color> = Vec::new(),
    arr_object: Vec<Entity> = Vec::new(),
    arr_curve: Vec<Curve> = Vec::new(),
    arr_gradient: Vec<Gradient> = Vec::new(),
    arr_vec2: Vec<Vec2> = Vec::new(),
    arr_vec3: Vec<Vec3> = Vec::new(),
    arr_vec4: Vec<Vec4> = Vec::new(),
    arr_ivec2: Vec<IVec2> = Vec::new(),
    arr_ivec3: Vec<IVec3> = Vec::new(),
    arr_rect: Vec<Rect> = Vec::new(),
    arr_int_rect: Vec<IntRect> = Vec::new(),
    arr_bounds: Vec<Bounds> = Vec::new(),
    arr_int_bounds: Vec<IntBounds> = Vec::new(),

    list_i: VecDeque<i32> = VecDeque::new(),
    list_f: VecDeque<f32> = VecDeque::new(),
    list_d: VecDeque<f64> = VecDeque::new(),
    list_s: VecDeque<String> = VecDeque::new(),
    list_b: VecDeque<bool> = VecDeque::new(),
    list_color: VecDeque<Color> = VecDeque::new(),
    list_object: VecDeque<Entity> = VecDeque::new(),
    list_curve: VecDeque<Curve> = VecDeque::new(),
    list_gradient: VecDeque<Gradient> = VecDeque::new(),
    list_vec2: VecDeque<Vec2> = VecDeque::new(),
    list_vec3: VecDeque<Vec3> = VecDeque::new(),
    list_vec4: VecDeque<Vec4> = VecDeque::new(),
    list_ivec2: VecDeque<IVec2> = VecDeque::new(),
    list_ivec3: VecDeque<IVec3> = VecDeque::new(),
    list_rect: VecDeque<Rect> = VecDeque::new(),
    list_int_rect: VecDeque<IntRect> = VecDeque::new(),
    list_bounds: VecDeque<Bounds> = VecDeque::new(),
    list_int_bounds: VecDeque<IntBounds> = VecDeque::new(),
}

impl Carrier {
    /// The field backing a slot, by slot index.
    pub fn slot(&self, index: usize) -> Option<&dyn Reflect> {
        Struct::field_at(self, index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        Struct::field_at_mut(self, index)
    }
}
