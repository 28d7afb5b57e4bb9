//! Uniform value types
//!
//! Values handed from a material to a GPU program:
//!
//! - [`Color`] - Linear RGBA colour
//! - [`TextureId`] - Texture reference resolved by the engine
//! - [`UniformValue`] - Typed uniform value (float, vectors, colour, texture)
//! - [`UniformKind`] - Value kind, as declared by a program
//! - [`UniformMap`] - Flat name -> value map filled once per frame

use std::fmt;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Linear RGBA colour with components in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::from_array(self.to_array())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Reference to a texture the engine resolves when binding the material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextureId {
    /// The engine's built-in default texture.
    #[default]
    Default,
    /// Named texture (URL or asset key).
    Named(String),
}

impl TextureId {
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            TextureId::Default => Self::DEFAULT_NAME,
            TextureId::Named(name) => name,
        }
    }
}

impl From<String> for TextureId {
    fn from(name: String) -> Self {
        if name == Self::DEFAULT_NAME {
            TextureId::Default
        } else {
            TextureId::Named(name)
        }
    }
}

impl From<&str> for TextureId {
    fn from(name: &str) -> Self {
        TextureId::from(name.to_string())
    }
}

impl From<TextureId> for String {
    fn from(id: TextureId) -> Self {
        match id {
            TextureId::Default => TextureId::DEFAULT_NAME.to_string(),
            TextureId::Named(name) => name,
        }
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value a program expects for a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// Single f32 value.
    Float,
    /// 2-component float vector.
    Vec2,
    /// 3-component float vector.
    Vec3,
    /// 4-component float vector (also colours).
    Vec4,
    /// Texture reference.
    Texture,
}

impl UniformKind {
    /// Size in bytes inside a uniform block, `None` for textures.
    pub fn byte_size(self) -> Option<usize> {
        match self {
            UniformKind::Float => Some(4),
            UniformKind::Vec2 => Some(8),
            UniformKind::Vec3 => Some(12),
            UniformKind::Vec4 => Some(16),
            UniformKind::Texture => None,
        }
    }
}

/// A typed uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Color),
    Texture(TextureId),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) | UniformValue::Color(_) => UniformKind::Vec4,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            UniformValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            UniformValue::Color(c) => Some(*c),
            UniformValue::Vec4(v) => Some(Color::from(v.to_array())),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureId> {
        match self {
            UniformValue::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// Raw float components, `None` for textures.
    pub fn components(&self) -> Option<Vec<f32>> {
        match self {
            UniformValue::Float(v) => Some(vec![*v]),
            UniformValue::Vec2(v) => Some(v.to_array().to_vec()),
            UniformValue::Vec3(v) => Some(v.to_array().to_vec()),
            UniformValue::Vec4(v) => Some(v.to_array().to_vec()),
            UniformValue::Color(c) => Some(c.to_array().to_vec()),
            UniformValue::Texture(_) => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        UniformValue::Color(c)
    }
}

impl From<TextureId> for UniformValue {
    fn from(t: TextureId) -> Self {
        UniformValue::Texture(t)
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Float(v) => write!(f, "{v}"),
            UniformValue::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            UniformValue::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            UniformValue::Vec4(v) => write!(f, "({}, {}, {}, {})", v.x, v.y, v.z, v.w),
            UniformValue::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            UniformValue::Texture(t) => write!(f, "texture({t})"),
        }
    }
}

/// Flat uniform name -> value map.
///
/// Entries keep insertion order and [`set`](Self::set) overwrites in place,
/// so a map reused across frames stops allocating after the first fill.
/// Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct UniformMap {
    entries: Vec<(&'static str, UniformValue)>,
}

impl UniformMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or overwrite a value.
    pub fn set(&mut self, name: &'static str, value: impl Into<UniformValue>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Into<UniformValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(UniformValue::as_float)
    }

    pub fn get_vec2(&self, name: &str) -> Option<Vec2> {
        self.get(name).and_then(UniformValue::as_vec2)
    }

    pub fn get_color(&self, name: &str) -> Option<Color> {
        self.get(name).and_then(UniformValue::as_color)
    }

    pub fn get_texture(&self, name: &str) -> Option<&TextureId> {
        self.get(name).and_then(UniformValue::as_texture)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// True when the key set is exactly `names`.
    pub fn has_exact_keys(&self, names: &[&str]) -> bool {
        self.entries.len() == names.len() && names.iter().all(|name| self.contains(name))
    }
}

impl PartialEq for UniformMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}
