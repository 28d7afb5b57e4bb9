//! Animated materials and the per-frame bridge.
//!
//! Each material is a parameter bundle: a struct of named [`PropertySlot`]s
//! built from an options struct. The engine never reads slots directly; it
//! goes through a [`MaterialBridge`], which asks the bundle for its type tag
//! and evaluates every slot into a flat [`UniformMap`].
//!
//! Built-in materials:
//! - [`PolylineFlowMaterial`] - Texture scrolling along a polyline (`"PolylineFlow"`)
//! - [`WallFlowMaterial`] - Glowing band flowing around a wall (`"WallFlowClockwise"` / `"WallFlowCounterclockwise"`)
//! - [`WaterMaterial`] - Animated water surface (`"Water"`)
//!
//! [`PropertySlot`]: crate::property::PropertySlot

mod polyline_flow;
mod wall_flow;
mod water;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::MaterialResult;
use crate::property::{Listener, ListenerId, ObservableSlot};
use crate::registry::ShaderRegistry;
use crate::time::SimTime;
use crate::value::UniformMap;

pub use polyline_flow::{PolylineFlowMaterial, PolylineFlowOptions, POLYLINE_FLOW_TYPE};
pub use wall_flow::{FlowDirection, WallFlowMaterial, WallFlowOptions};
pub use water::{WaterMaterial, WaterOptions, WATER_TYPE};

/// A material parameter bundle.
pub trait MaterialBundle: Any + Send + fmt::Debug {
    /// Registered type name of the program that draws this bundle.
    ///
    /// Only changes when the bundle's shader variant is reassigned.
    fn material_type(&self, time: SimTime) -> &'static str;

    /// Uniform names written by [`evaluate_into`](Self::evaluate_into).
    fn uniform_names(&self) -> &'static [&'static str];

    /// Write every uniform's value at `time` into `result`.
    fn evaluate_into(&self, time: SimTime, result: &mut UniformMap);

    fn slots(&self) -> Vec<&dyn ObservableSlot>;

    fn slots_mut(&mut self) -> Vec<&mut dyn ObservableSlot>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Same concrete type with value-equal slots.
    fn equals(&self, other: &dyn MaterialBundle) -> bool;

    /// Observe every slot with one listener.
    fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        for slot in self.slots_mut() {
            slot.listeners_mut().insert(id, Arc::clone(&listener));
        }
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for slot in self.slots_mut() {
            removed |= slot.listeners_mut().unsubscribe(id);
        }
        removed
    }

    /// True when no slot depends on time.
    fn is_constant(&self) -> bool {
        self.slots().iter().all(|slot| slot.is_constant())
    }
}

/// Shared [`MaterialBundle::equals`] body for bundles with `PartialEq`.
fn bundle_eq<B: MaterialBundle + PartialEq>(bundle: &B, other: &dyn MaterialBundle) -> bool {
    other
        .as_any()
        .downcast_ref::<B>()
        .is_some_and(|other| other == bundle)
}

/// Adapter the engine calls once per visible instance per frame.
///
/// Evaluation has no side effects beyond filling the result map. A `None`
/// time means the current wall-clock time.
pub struct MaterialBridge<M: MaterialBundle + ?Sized = dyn MaterialBundle> {
    bundle: Box<M>,
}

impl<M: MaterialBundle> MaterialBridge<M> {
    pub fn new(bundle: M) -> Self {
        Self {
            bundle: Box::new(bundle),
        }
    }

    pub fn into_dyn(self) -> MaterialBridge {
        MaterialBridge {
            bundle: self.bundle,
        }
    }
}

impl<M: MaterialBundle + ?Sized> MaterialBridge<M> {
    pub fn from_box(bundle: Box<M>) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &M {
        &self.bundle
    }

    pub fn bundle_mut(&mut self) -> &mut M {
        &mut self.bundle
    }

    pub fn material_type(&self, time: Option<SimTime>) -> &'static str {
        self.bundle.material_type(time.unwrap_or_else(SimTime::now))
    }

    /// Evaluate into a fresh map.
    pub fn evaluate(&self, time: Option<SimTime>) -> UniformMap {
        let mut result = UniformMap::with_capacity(self.bundle.uniform_names().len());
        self.evaluate_into(time, &mut result);
        result
    }

    /// Evaluate into a caller-owned map.
    ///
    /// A map last filled by a material with the same uniforms is overwritten
    /// in place; anything else is cleared first.
    pub fn evaluate_into(&self, time: Option<SimTime>, result: &mut UniformMap) {
        if !result.has_exact_keys(self.bundle.uniform_names()) {
            result.clear();
        }
        self.bundle
            .evaluate_into(time.unwrap_or_else(SimTime::now), result);
    }
}

impl<M: MaterialBundle + ?Sized> fmt::Debug for MaterialBridge<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialBridge")
            .field("bundle", &self.bundle)
            .finish()
    }
}

/// Register the programs of every built-in material.
pub fn register_builtin_materials(registry: &mut ShaderRegistry) -> MaterialResult<()> {
    registry.register(PolylineFlowMaterial::descriptor())?;
    for descriptor in WallFlowMaterial::descriptors() {
        registry.register(descriptor)?;
    }
    registry.register(WaterMaterial::descriptor())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::property::{CallbackProperty, PropertyChanged};
    use crate::value::Color;

    #[test]
    fn builtin_materials_register() {
        let mut registry = ShaderRegistry::new();
        register_builtin_materials(&mut registry).unwrap();
        assert_eq!(
            registry.type_names().collect::<Vec<_>>(),
            vec![
                "PolylineFlow",
                "WallFlowClockwise",
                "WallFlowCounterclockwise",
                "Water"
            ]
        );
    }

    #[test]
    fn evaluate_keys_match_program() {
        let mut registry = ShaderRegistry::new();
        register_builtin_materials(&mut registry).unwrap();

        let bridges: Vec<MaterialBridge> = vec![
            MaterialBridge::new(PolylineFlowMaterial::default()).into_dyn(),
            MaterialBridge::new(WallFlowMaterial::default()).into_dyn(),
            MaterialBridge::new(WaterMaterial::default()).into_dyn(),
        ];
        for bridge in &bridges {
            let time = Some(SimTime::from_seconds(3.0));
            let descriptor = registry.lookup(bridge.material_type(time)).unwrap();
            let uniforms = bridge.evaluate(time);
            let declared: Vec<&str> = descriptor.interface().declarations().map(|(n, _)| n).collect();
            assert!(uniforms.has_exact_keys(&declared), "{}", descriptor.type_name());
        }
    }

    #[test]
    fn reused_map_is_cleared_for_other_material() {
        let water = MaterialBridge::new(WaterMaterial::default());
        let polyline = MaterialBridge::new(PolylineFlowMaterial::default());

        let mut result = UniformMap::new();
        water.evaluate_into(Some(SimTime::ZERO), &mut result);
        polyline.evaluate_into(Some(SimTime::ZERO), &mut result);
        assert_eq!(result, polyline.evaluate(Some(SimTime::ZERO)));

        polyline.evaluate_into(Some(SimTime::ZERO), &mut result);
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn bundle_listener_sees_every_slot() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Listener = Arc::new(move |event: &PropertyChanged| {
            sink.lock().unwrap().push(event.property);
        });

        let mut material = PolylineFlowMaterial::default();
        let id = material.subscribe(listener);
        material.set_speed(2.0_f32);
        material.set_color(Color::BLACK);
        assert_eq!(*seen.lock().unwrap(), vec!["speed", "color"]);

        assert!(material.unsubscribe(id));
        material.set_speed(3.0_f32);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn equality_requires_same_type() {
        let water = WaterMaterial::default();
        let polyline = PolylineFlowMaterial::default();
        assert!(water.equals(&WaterMaterial::default()));
        assert!(!water.equals(&polyline));
    }

    #[test]
    fn constancy_follows_slots() {
        let mut material = WaterMaterial::default();
        assert!(material.is_constant());
        material.set_amplitude(CallbackProperty::<f32>::new(
            |t| Ok(t.seconds() as f32),
            false,
        ));
        assert!(!material.is_constant());
    }
}
