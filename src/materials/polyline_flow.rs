//! Flowing polyline material.

use std::any::Any;

use glam::Vec2;
use serde::Deserialize;

use super::{bundle_eq, MaterialBundle};
use crate::property::{ObservableSlot, Property, PropertySlot};
use crate::registry::MaterialDescriptor;
use crate::time::SimTime;
use crate::value::{Color, TextureId, UniformMap};

pub const POLYLINE_FLOW_TYPE: &str = "PolylineFlow";

const PROGRAM: &str = concat!(
    include_str!("../../shaders/materials/common.wgsl"),
    include_str!("../../shaders/materials/polyline_flow.wgsl"),
);

const UNIFORMS: &[&str] = &["color", "image", "forward", "speed", "repeat"];

/// Construction options; unset fields take the material defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolylineFlowOptions {
    pub color: Option<Property<Color>>,
    pub image: Option<Property<TextureId>>,
    pub forward: Option<Property<f32>>,
    pub speed: Option<Property<f32>>,
    pub repeat: Option<Property<Vec2>>,
}

/// Scrolls `image`, tinted by `color`, along a polyline.
///
/// | Uniform | Default |
/// |---------|---------|
/// | `color` | opaque white |
/// | `image` | [`TextureId::Default`] |
/// | `forward` | 1.0 (positive flows towards the last vertex) |
/// | `speed` | 1.0 |
/// | `repeat` | (1, 1) |
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineFlowMaterial {
    color: PropertySlot<Color>,
    image: PropertySlot<TextureId>,
    forward: PropertySlot<f32>,
    speed: PropertySlot<f32>,
    repeat: PropertySlot<Vec2>,
}

impl Default for PolylineFlowMaterial {
    fn default() -> Self {
        Self::new(PolylineFlowOptions::default())
    }
}

impl PolylineFlowMaterial {
    pub fn new(options: PolylineFlowOptions) -> Self {
        Self {
            color: PropertySlot::new("color", Color::WHITE).with_definition(options.color),
            image: PropertySlot::new("image", TextureId::Default).with_definition(options.image),
            forward: PropertySlot::new("forward", 1.0).with_definition(options.forward),
            speed: PropertySlot::new("speed", 1.0).with_definition(options.speed),
            repeat: PropertySlot::new("repeat", Vec2::ONE).with_definition(options.repeat),
        }
    }

    /// Registry entry for this material.
    pub fn descriptor() -> MaterialDescriptor {
        let mut defaults = UniformMap::with_capacity(UNIFORMS.len());
        Self::default().evaluate_into(SimTime::ZERO, &mut defaults);
        MaterialDescriptor::new(POLYLINE_FLOW_TYPE, PROGRAM, defaults)
    }

    pub fn color(&self) -> &PropertySlot<Color> {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<Property<Color>>) -> bool {
        self.color.set(color)
    }

    pub fn image(&self) -> &PropertySlot<TextureId> {
        &self.image
    }

    pub fn set_image(&mut self, image: impl Into<Property<TextureId>>) -> bool {
        self.image.set(image)
    }

    pub fn forward(&self) -> &PropertySlot<f32> {
        &self.forward
    }

    pub fn set_forward(&mut self, forward: impl Into<Property<f32>>) -> bool {
        self.forward.set(forward)
    }

    pub fn speed(&self) -> &PropertySlot<f32> {
        &self.speed
    }

    pub fn set_speed(&mut self, speed: impl Into<Property<f32>>) -> bool {
        self.speed.set(speed)
    }

    pub fn repeat(&self) -> &PropertySlot<Vec2> {
        &self.repeat
    }

    pub fn set_repeat(&mut self, repeat: impl Into<Property<Vec2>>) -> bool {
        self.repeat.set(repeat)
    }
}

impl MaterialBundle for PolylineFlowMaterial {
    fn material_type(&self, _time: SimTime) -> &'static str {
        POLYLINE_FLOW_TYPE
    }

    fn uniform_names(&self) -> &'static [&'static str] {
        UNIFORMS
    }

    fn evaluate_into(&self, time: SimTime, result: &mut UniformMap) {
        result.set(self.color.name(), self.color.evaluate(time));
        result.set(self.image.name(), self.image.evaluate(time));
        result.set(self.forward.name(), self.forward.evaluate(time));
        result.set(self.speed.name(), self.speed.evaluate(time));
        result.set(self.repeat.name(), self.repeat.evaluate(time));
    }

    fn slots(&self) -> Vec<&dyn ObservableSlot> {
        let slots: [&dyn ObservableSlot; 5] = [
            &self.color,
            &self.image,
            &self.forward,
            &self.speed,
            &self.repeat,
        ];
        slots.into()
    }

    fn slots_mut(&mut self) -> Vec<&mut dyn ObservableSlot> {
        let slots: [&mut dyn ObservableSlot; 5] = [
            &mut self.color,
            &mut self.image,
            &mut self.forward,
            &mut self.speed,
            &mut self.repeat,
        ];
        slots.into()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn equals(&self, other: &dyn MaterialBundle) -> bool {
        bundle_eq(self, other)
    }
}
