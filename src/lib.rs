//! Animated Materials - time-sampled shader material properties
//!
//! Declarative, possibly time-varying material parameters are sampled once
//! per rendered frame and handed to a GPU program as concrete uniform values.
//!
//! # Features
//! - Constant, keyframed and callback-driven properties with change notification
//! - Built-in flowing polyline, flowing wall and water surface materials
//! - Shader variant registry with WGSL validation and uniform reflection (naga)
//! - Frame driver that applies queued cross-thread updates before evaluation
//! - TOML material presets
//!
//! # Example
//!
//! ```ignore
//! use animated_materials::{MaterialBridge, SimTime, WallFlowMaterial, WallFlowOptions};
//!
//! animated_materials::init()?;
//!
//! let bridge = MaterialBridge::new(WallFlowMaterial::new(WallFlowOptions {
//!     speed: Some(2.5.into()),
//!     ..Default::default()
//! }));
//! let time = Some(SimTime::from_seconds(12.0));
//! let program = animated_materials::global_registry().read().lookup(bridge.material_type(time));
//! let uniforms = bridge.evaluate(time);
//! ```

pub mod config;
pub mod error;
pub mod materials;
pub mod property;
pub mod registry;
pub mod scene;
pub mod shader;
pub mod time;
pub mod value;

pub use config::{load_config, parse_config, ClockConfig, MaterialOptions, PreviewConfig};
pub use error::{ConfigError, MaterialError, MaterialResult, PropertyError};
pub use materials::{
    register_builtin_materials, FlowDirection, MaterialBridge, MaterialBundle,
    PolylineFlowMaterial, PolylineFlowOptions, WallFlowMaterial, WallFlowOptions, WaterMaterial,
    WaterOptions,
};
pub use property::{
    CallbackProperty, Extrapolation, Property, PropertyChanged, PropertySlot, SampledProperty,
    SampledSource,
};
pub use registry::{
    global_registry, init, MaterialDescriptor, Registration, ShaderRegistry, Translucency,
};
pub use scene::{FrameMaterial, FrameStats, InstanceId, MaterialScene, MaterialUpdates};
pub use time::{Clock, SimTime};
pub use value::{Color, TextureId, UniformKind, UniformMap, UniformValue};
