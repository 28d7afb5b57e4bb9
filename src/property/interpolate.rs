use glam::{Vec2, Vec3, Vec4};

use super::PropertyValue;
use crate::value::{Color, TextureId};

/// Blending between two keyframe values.
///
/// `t` is the normalized position between `self` (0.0) and `other` (1.0).
pub trait Interpolate: PropertyValue {
    fn interpolate(&self, other: &Self, t: f64) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t as f32
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vec2 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t as f32)
    }
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t as f32)
    }
}

impl Interpolate for Vec4 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t as f32)
    }
}

impl Interpolate for Color {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        Color::from(self.to_vec4().lerp(other.to_vec4(), t as f32).to_array())
    }
}

// Textures cannot blend: hold the earlier keyframe until the next one is reached.
impl Interpolate for TextureId {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        if t >= 1.0 {
            other.clone()
        } else {
            self.clone()
        }
    }
}
