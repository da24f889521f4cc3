//! Engine value types that bevy does not ship, so the carrier has a field for every kind of value
//! the map editor knows how to draw.

use bevy::prelude::*;

/// An integer rectangle, given by its minimum and maximum corners.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[reflect(Default, PartialEq, Hash)]
pub struct IntRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl IntRect {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn contains(&self, point: IVec2) -> bool {
        point.cmpge(self.min).all() && point.cmplt(self.max).all()
    }
}

/// An axis aligned bounding box, stored as a center and half extents.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Default, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }

    /// Grow the bounds so that they contain `point`.
    pub fn encapsulate(&mut self, point: Vec3) {
        *self = Self::from_min_max(self.min().min(point), self.max().max(point));
    }
}

/// An integer bounding box, stored as a position (minimum corner) and a size.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[reflect(Default, PartialEq, Hash)]
pub struct IntBounds {
    pub position: IVec3,
    pub size: IVec3,
}

impl IntBounds {
    pub fn min(&self) -> IVec3 {
        self.position
    }

    pub fn max(&self) -> IVec3 {
        self.position + self.size
    }

    pub fn contains(&self, point: IVec3) -> bool {
        point.cmpge(self.min()).all() && point.cmplt(self.max()).all()
    }
}

/// A single key of a [`Curve`].
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Default, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    pub in_tangent: f32,
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            ..default()
        }
    }
}

/// An animation curve. Keys are kept sorted by time and interpolated with cubic hermite splines.
#[derive(Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Default, PartialEq)]
pub struct Curve {
    pub keys: Vec<Keyframe>,
}

impl Curve {
    pub fn linear(start: Keyframe, end: Keyframe) -> Self {
        let slope = (end.value - start.value) / (end.time - start.time).max(f32::EPSILON);
        Self {
            keys: vec![
                Keyframe {
                    out_tangent: slope,
                    ..start
                },
                Keyframe {
                    in_tangent: slope,
                    ..end
                },
            ],
        }
    }

    /// Insert a key, keeping the keys sorted. Returns the index it was inserted at.
    pub fn add_key(&mut self, key: Keyframe) -> usize {
        let index = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(index, key);
        index
    }

    /// Sample the curve at `time`. Times outside the keyed range clamp to the first or last key.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let next = self.keys.partition_point(|k| k.time <= time);
        let (a, b) = (&self.keys[next - 1], &self.keys[next]);
        let dt = b.time - a.time;
        if dt <= f32::EPSILON {
            return b.value;
        }

        let s = (time - a.time) / dt;
        let (s2, s3) = (s * s, s * s * s);
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        h00 * a.value + h10 * dt * a.out_tangent + h01 * b.value + h11 * dt * b.in_tangent
    }
}

/// A color key of a [`Gradient`].
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Default, PartialEq)]
pub struct GradientStop {
    pub time: f32,
    pub color: Color,
}

/// A color gradient over `0.0..=1.0`, blended linearly between stops.
#[derive(Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Default, PartialEq)]
pub struct Gradient {
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn new(from: Color, to: Color) -> Self {
        Self {
            stops: vec![
                GradientStop {
                    time: 0.0,
                    color: from,
                },
                GradientStop {
                    time: 1.0,
                    color: to,
                },
            ],
        }
    }

    pub fn evaluate(&self, time: f32) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::WHITE;
        };
        if time <= first.time {
            return first.color;
        }
        if time >= last.time {
            return last.color;
        }

        let next = self.stops.partition_point(|s| s.time <= time);
        let (a, b) = (&self.stops[next - 1], &self.stops[next]);
        let span = (b.time - a.time).max(f32::EPSILON);
        let t = (time - a.time) / span;
        let from = Vec4::from_array(a.color.as_rgba_f32());
        let to = Vec4::from_array(b.color.as_rgba_f32());
        let mixed = from.lerp(to, t);
        Color::rgba(mixed.x, mixed.y, mixed.z, mixed.w)
    }
}
