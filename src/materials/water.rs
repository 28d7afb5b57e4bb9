//! Water surface material.

use std::any::Any;

use serde::Deserialize;

use super::{bundle_eq, MaterialBundle};
use crate::property::{ObservableSlot, Property, PropertySlot};
use crate::registry::MaterialDescriptor;
use crate::time::SimTime;
use crate::value::{Color, TextureId, UniformMap};

pub const WATER_TYPE: &str = "Water";

const PROGRAM: &str = concat!(
    include_str!("../../shaders/materials/common.wgsl"),
    include_str!("../../shaders/materials/water.wgsl"),
);

const UNIFORMS: &[&str] = &[
    "normalMap",
    "frequency",
    "animationSpeed",
    "amplitude",
    "specularIntensity",
    "baseWaterColor",
    "blendColor",
    "fadeFactor",
];

const BASE_WATER_COLOR: Color = Color::new(0.2, 0.3, 0.6, 1.0);
const BLEND_COLOR: Color = Color::new(0.0, 1.0, 0.699, 1.0);

/// Construction options; unset fields take the material defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaterOptions {
    pub normal_map: Option<Property<TextureId>>,
    pub frequency: Option<Property<f32>>,
    pub animation_speed: Option<Property<f32>>,
    pub amplitude: Option<Property<f32>>,
    pub specular_intensity: Option<Property<f32>>,
    pub base_water_color: Option<Property<Color>>,
    pub blend_color: Option<Property<Color>>,
    pub fade_factor: Option<Property<f32>>,
}

/// Animated water surface.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterMaterial {
    normal_map: PropertySlot<TextureId>,
    /// Number of waves.
    frequency: PropertySlot<f32>,
    animation_speed: PropertySlot<f32>,
    amplitude: PropertySlot<f32>,
    specular_intensity: PropertySlot<f32>,
    base_water_color: PropertySlot<Color>,
    /// Colour blended in where the surface faces the light.
    blend_color: PropertySlot<Color>,
    /// Scales the alpha of the surface.
    fade_factor: PropertySlot<f32>,
}

impl Default for WaterMaterial {
    fn default() -> Self {
        Self::new(WaterOptions::default())
    }
}

impl WaterMaterial {
    pub fn new(options: WaterOptions) -> Self {
        Self {
            normal_map: PropertySlot::new("normalMap", TextureId::Default)
                .with_definition(options.normal_map),
            frequency: PropertySlot::new("frequency", 40.0).with_definition(options.frequency),
            animation_speed: PropertySlot::new("animationSpeed", 0.003)
                .with_definition(options.animation_speed),
            amplitude: PropertySlot::new("amplitude", 10.0).with_definition(options.amplitude),
            specular_intensity: PropertySlot::new("specularIntensity", 0.01)
                .with_definition(options.specular_intensity),
            base_water_color: PropertySlot::new("baseWaterColor", BASE_WATER_COLOR)
                .with_definition(options.base_water_color),
            blend_color: PropertySlot::new("blendColor", BLEND_COLOR)
                .with_definition(options.blend_color),
            fade_factor: PropertySlot::new("fadeFactor", 1.0).with_definition(options.fade_factor),
        }
    }

    pub fn descriptor() -> MaterialDescriptor {
        let mut defaults = UniformMap::with_capacity(UNIFORMS.len());
        Self::default().evaluate_into(SimTime::ZERO, &mut defaults);
        MaterialDescriptor::new(WATER_TYPE, PROGRAM, defaults)
    }

    pub fn normal_map(&self) -> &PropertySlot<TextureId> {
        &self.normal_map
    }

    pub fn set_normal_map(&mut self, normal_map: impl Into<Property<TextureId>>) -> bool {
        self.normal_map.set(normal_map)
    }

    pub fn frequency(&self) -> &PropertySlot<f32> {
        &self.frequency
    }

    pub fn set_frequency(&mut self, frequency: impl Into<Property<f32>>) -> bool {
        self.frequency.set(frequency)
    }

    pub fn animation_speed(&self) -> &PropertySlot<f32> {
        &self.animation_speed
    }

    pub fn set_animation_speed(&mut self, speed: impl Into<Property<f32>>) -> bool {
        self.animation_speed.set(speed)
    }

    pub fn amplitude(&self) -> &PropertySlot<f32> {
        &self.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: impl Into<Property<f32>>) -> bool {
        self.amplitude.set(amplitude)
    }

    pub fn specular_intensity(&self) -> &PropertySlot<f32> {
        &self.specular_intensity
    }

    pub fn set_specular_intensity(&mut self, intensity: impl Into<Property<f32>>) -> bool {
        self.specular_intensity.set(intensity)
    }

    pub fn base_water_color(&self) -> &PropertySlot<Color> {
        &self.base_water_color
    }

    pub fn set_base_water_color(&mut self, color: impl Into<Property<Color>>) -> bool {
        self.base_water_color.set(color)
    }

    pub fn blend_color(&self) -> &PropertySlot<Color> {
        &self.blend_color
    }

    pub fn set_blend_color(&mut self, color: impl Into<Property<Color>>) -> bool {
        self.blend_color.set(color)
    }

    pub fn fade_factor(&self) -> &PropertySlot<f32> {
        &self.fade_factor
    }

    pub fn set_fade_factor(&mut self, fade: impl Into<Property<f32>>) -> bool {
        self.fade_factor.set(fade)
    }
}

impl MaterialBundle for WaterMaterial {
    fn material_type(&self, _time: SimTime) -> &'static str {
        WATER_TYPE
    }

    fn uniform_names(&self) -> &'static [&'static str] {
        UNIFORMS
    }

    fn evaluate_into(&self, time: SimTime, result: &mut UniformMap) {
        result.set(self.normal_map.name(), self.normal_map.evaluate(time));
        result.set(self.frequency.name(), self.frequency.evaluate(time));
        result.set(self.animation_speed.name(), self.animation_speed.evaluate(time));
        result.set(self.amplitude.name(), self.amplitude.evaluate(time));
        result.set(
            self.specular_intensity.name(),
            self.specular_intensity.evaluate(time),
        );
        result.set(self.base_water_color.name(), self.base_water_color.evaluate(time));
        result.set(self.blend_color.name(), self.blend_color.evaluate(time));
        result.set(self.fade_factor.name(), self.fade_factor.evaluate(time));
    }

    fn slots(&self) -> Vec<&dyn ObservableSlot> {
        let slots: [&dyn ObservableSlot; 8] = [
            &self.normal_map,
            &self.frequency,
            &self.animation_speed,
            &self.amplitude,
            &self.specular_intensity,
            &self.base_water_color,
            &self.blend_color,
            &self.fade_factor,
        ];
        slots.into()
    }

    fn slots_mut(&mut self) -> Vec<&mut dyn ObservableSlot> {
        let slots: [&mut dyn ObservableSlot; 8] = [
            &mut self.normal_map,
            &mut self.frequency,
            &mut self.animation_speed,
            &mut self.amplitude,
            &mut self.specular_intensity,
            &mut self.base_water_color,
            &mut self.blend_color,
            &mut self.fade_factor,
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
