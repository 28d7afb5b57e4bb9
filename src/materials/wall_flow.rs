//! Flowing wall material and its two shader variants.

use std::any::Any;

use glam::Vec2;
use serde::Deserialize;

use super::{bundle_eq, MaterialBundle};
use crate::property::{ObservableSlot, Property, PropertySlot};
use crate::registry::{MaterialDescriptor, Translucency};
use crate::time::SimTime;
use crate::value::{Color, UniformMap};

const CLOCKWISE_PROGRAM: &str = concat!(
    "const FLOW_SIGN: f32 = 1.0;\n",
    include_str!("../../shaders/materials/common.wgsl"),
    include_str!("../../shaders/materials/wall_flow.wgsl"),
);

const COUNTERCLOCKWISE_PROGRAM: &str = concat!(
    "const FLOW_SIGN: f32 = -1.0;\n",
    include_str!("../../shaders/materials/common.wgsl"),
    include_str!("../../shaders/materials/wall_flow.wgsl"),
);

const UNIFORMS: &[&str] = &["color", "speed", "repeat", "minimumHeight", "maximumHeight"];

/// Direction the band travels around the wall; selects the shader variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    #[default]
    Clockwise,
    Counterclockwise,
}

impl FlowDirection {
    pub const ALL: [FlowDirection; 2] = [FlowDirection::Clockwise, FlowDirection::Counterclockwise];

    /// Registered type name of the variant.
    pub fn type_name(self) -> &'static str {
        match self {
            FlowDirection::Clockwise => "WallFlowClockwise",
            FlowDirection::Counterclockwise => "WallFlowCounterclockwise",
        }
    }

    fn program(self) -> &'static str {
        match self {
            FlowDirection::Clockwise => CLOCKWISE_PROGRAM,
            FlowDirection::Counterclockwise => COUNTERCLOCKWISE_PROGRAM,
        }
    }
}

/// Construction options; unset fields take the material defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WallFlowOptions {
    pub color: Option<Property<Color>>,
    pub speed: Option<Property<f32>>,
    pub repeat: Option<Property<Vec2>>,
    pub minimum_height: Option<Property<f32>>,
    pub maximum_height: Option<Property<f32>>,
    pub shader_variant: Option<FlowDirection>,
}

/// Glowing band running around a wall, fading out towards `maximumHeight`.
///
/// Both variants always draw in the translucent pass.
///
/// | Uniform | Default |
/// |---------|---------|
/// | `color` | opaque white |
/// | `speed` | 1.0 |
/// | `repeat` | (1, 1) |
/// | `minimumHeight` | 0.0 |
/// | `maximumHeight` | 100.0 |
#[derive(Debug, Clone, PartialEq)]
pub struct WallFlowMaterial {
    color: PropertySlot<Color>,
    speed: PropertySlot<f32>,
    repeat: PropertySlot<Vec2>,
    minimum_height: PropertySlot<f32>,
    maximum_height: PropertySlot<f32>,
    /// Not a uniform; only ever holds a constant.
    shader_variant: PropertySlot<FlowDirection>,
}

impl Default for WallFlowMaterial {
    fn default() -> Self {
        Self::new(WallFlowOptions::default())
    }
}

impl WallFlowMaterial {
    pub fn new(options: WallFlowOptions) -> Self {
        Self {
            color: PropertySlot::new("color", Color::WHITE).with_definition(options.color),
            speed: PropertySlot::new("speed", 1.0).with_definition(options.speed),
            repeat: PropertySlot::new("repeat", Vec2::ONE).with_definition(options.repeat),
            minimum_height: PropertySlot::new("minimumHeight", 0.0)
                .with_definition(options.minimum_height),
            maximum_height: PropertySlot::new("maximumHeight", 100.0)
                .with_definition(options.maximum_height),
            shader_variant: PropertySlot::new("shaderVariant", FlowDirection::default())
                .with_definition(options.shader_variant.map(Property::constant)),
        }
    }

    /// Registry entries for both variants.
    pub fn descriptors() -> Vec<MaterialDescriptor> {
        let mut defaults = UniformMap::with_capacity(UNIFORMS.len());
        Self::default().evaluate_into(SimTime::ZERO, &mut defaults);

        FlowDirection::ALL
            .into_iter()
            .map(|direction| {
                MaterialDescriptor::new(direction.type_name(), direction.program(), defaults.clone())
                    .with_translucency(Translucency::Fixed(true))
            })
            .collect()
    }

    pub fn color(&self) -> &PropertySlot<Color> {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<Property<Color>>) -> bool {
        self.color.set(color)
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

    pub fn minimum_height(&self) -> &PropertySlot<f32> {
        &self.minimum_height
    }

    pub fn set_minimum_height(&mut self, height: impl Into<Property<f32>>) -> bool {
        self.minimum_height.set(height)
    }

    pub fn maximum_height(&self) -> &PropertySlot<f32> {
        &self.maximum_height
    }

    pub fn set_maximum_height(&mut self, height: impl Into<Property<f32>>) -> bool {
        self.maximum_height.set(height)
    }

    pub fn shader_variant(&self) -> FlowDirection {
        self.shader_variant.evaluate(SimTime::ZERO)
    }

    /// Switch variant; the next frame looks up the other program.
    pub fn set_shader_variant(&mut self, direction: FlowDirection) -> bool {
        self.shader_variant.set(direction)
    }
}

impl MaterialBundle for WallFlowMaterial {
    fn material_type(&self, time: SimTime) -> &'static str {
        self.shader_variant.evaluate(time).type_name()
    }

    fn uniform_names(&self) -> &'static [&'static str] {
        UNIFORMS
    }

    fn evaluate_into(&self, time: SimTime, result: &mut UniformMap) {
        result.set(self.color.name(), self.color.evaluate(time));
        result.set(self.speed.name(), self.speed.evaluate(time));
        result.set(self.repeat.name(), self.repeat.evaluate(time));
        result.set(self.minimum_height.name(), self.minimum_height.evaluate(time));
        result.set(self.maximum_height.name(), self.maximum_height.evaluate(time));
    }

    fn slots(&self) -> Vec<&dyn ObservableSlot> {
        let slots: [&dyn ObservableSlot; 6] = [
            &self.color,
            &self.speed,
            &self.repeat,
            &self.minimum_height,
            &self.maximum_height,
            &self.shader_variant,
        ];
        slots.into()
    }

    fn slots_mut(&mut self) -> Vec<&mut dyn ObservableSlot> {
        let slots: [&mut dyn ObservableSlot; 6] = [
            &mut self.color,
            &mut self.speed,
            &mut self.repeat,
            &mut self.minimum_height,
            &mut self.maximum_height,
            &mut self.shader_variant,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_selects_type() {
        let mut material = WallFlowMaterial::default();
        assert_eq!(material.material_type(SimTime::ZERO), "WallFlowClockwise");
        assert_eq!(
            material.material_type(SimTime::from_seconds(1e4)),
            "WallFlowClockwise"
        );

        assert!(material.set_shader_variant(FlowDirection::Counterclockwise));
        assert!(!material.set_shader_variant(FlowDirection::Counterclockwise));
        assert_eq!(
            material.material_type(SimTime::ZERO),
            "WallFlowCounterclockwise"
        );
    }

    #[test]
    fn variant_is_part_of_equality() {
        let clockwise = WallFlowMaterial::default();
        let counter = WallFlowMaterial::new(WallFlowOptions {
            shader_variant: Some(FlowDirection::Counterclockwise),
            ..Default::default()
        });
        assert!(!clockwise.equals(&counter));
    }

    #[test]
    fn height_defaults() {
        let mut map = UniformMap::new();
        WallFlowMaterial::default().evaluate_into(SimTime::ZERO, &mut map);
        assert_eq!(map.get_float("minimumHeight"), Some(0.0));
        assert_eq!(map.get_float("maximumHeight"), Some(100.0));
        assert!(!map.contains("shaderVariant"));
    }

    #[test]
    fn variants_are_translucent() {
        let descriptors = WallFlowMaterial::descriptors();
        assert_eq!(descriptors.len(), 2);
        for descriptor in &descriptors {
            assert!(descriptor.is_translucent(descriptor.default_uniforms()));
        }
    }
}
