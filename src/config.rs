//! Material preset files.
//!
//! A preset is a TOML file with optional clock settings and a table of named
//! material instances. Every material parameter takes either a plain value
//! or a keyframe table:
//!
//! ```toml
//! [clock]
//! multiplier = 2.0
//!
//! [materials.river]
//! type = "water"
//! frequency = 20.0
//! baseWaterColor = { r = 0.1, g = 0.2, b = 0.5, a = 0.8 }
//!
//! [materials.fence]
//! type = "wall_flow"
//! shaderVariant = "counterclockwise"
//! speed = { samples = [[0.0, 1.0], [10.0, 4.0]] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::materials::{
    MaterialBundle, PolylineFlowMaterial, PolylineFlowOptions, WallFlowMaterial, WallFlowOptions,
    WaterMaterial, WaterOptions,
};
use crate::time::{Clock, SimTime};

/// Top-level preset file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub clock: ClockConfig,
    /// Instance name -> material options, in name order.
    pub materials: BTreeMap<String, MaterialOptions>,
}

/// Initial state of the simulation clock.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Start time in seconds.
    pub start: f64,
    pub multiplier: f64,
    pub paused: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            multiplier: 1.0,
            paused: false,
        }
    }
}

impl ClockConfig {
    pub fn build(&self) -> Clock {
        Clock::new(SimTime::from_seconds(self.start))
            .with_multiplier(self.multiplier)
            .with_paused(self.paused)
    }
}

/// Options for one material instance, selected by its `type` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialOptions {
    Water(WaterOptions),
    PolylineFlow(PolylineFlowOptions),
    WallFlow(WallFlowOptions),
}

impl MaterialOptions {
    pub fn into_bundle(self) -> Box<dyn MaterialBundle> {
        match self {
            MaterialOptions::Water(options) => Box::new(WaterMaterial::new(options)),
            MaterialOptions::PolylineFlow(options) => Box::new(PolylineFlowMaterial::new(options)),
            MaterialOptions::WallFlow(options) => Box::new(WallFlowMaterial::new(options)),
        }
    }
}

/// Parse a preset from TOML text.
pub fn parse_config(content: &str) -> Result<PreviewConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load a preset file.
pub fn load_config(path: &Path) -> Result<PreviewConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;
    log::debug!(
        "Loaded {} material presets from {}",
        config.materials.len(),
        path.display()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Color, UniformMap};

    const PRESET: &str = r#"
[clock]
start = 5.0
multiplier = 2.0

[materials.river]
type = "water"
frequency = 20.0
baseWaterColor = { r = 0.1, g = 0.2, b = 0.5, a = 0.8 }

[materials.fence]
type = "wall_flow"
shaderVariant = "counterclockwise"
speed = { samples = [[0.0, 1.0], [10.0, 4.0]] }

[materials.route]
type = "polyline_flow"
speed = 0
image = "arrows.png"
repeat = [4.0, 1.0]
"#;

    fn evaluate(bundle: &dyn MaterialBundle, seconds: f64) -> UniformMap {
        let mut map = UniformMap::new();
        bundle.evaluate_into(SimTime::from_seconds(seconds), &mut map);
        map
    }

    #[test]
    fn parses_clock_and_materials() {
        let config = parse_config(PRESET).unwrap();
        assert_eq!(config.clock.start, 5.0);
        assert_eq!(config.clock.multiplier, 2.0);
        assert!(!config.clock.paused);
        assert_eq!(
            config.materials.keys().collect::<Vec<_>>(),
            vec!["fence", "river", "route"]
        );
    }

    #[test]
    fn builds_configured_bundles() {
        let mut config = parse_config(PRESET).unwrap();

        let river = config.materials.remove("river").unwrap().into_bundle();
        let uniforms = evaluate(&*river, 0.0);
        assert_eq!(river.material_type(SimTime::ZERO), "Water");
        assert_eq!(uniforms.get_float("frequency"), Some(20.0));
        assert_eq!(uniforms.get_float("amplitude"), Some(10.0));
        assert_eq!(
            uniforms.get_color("baseWaterColor"),
            Some(Color::new(0.1, 0.2, 0.5, 0.8))
        );

        let fence = config.materials.remove("fence").unwrap().into_bundle();
        assert_eq!(fence.material_type(SimTime::ZERO), "WallFlowCounterclockwise");
        assert_eq!(evaluate(&*fence, 5.0).get_float("speed"), Some(2.5));
        assert!(!fence.is_constant());

        let route = config.materials.remove("route").unwrap().into_bundle();
        let uniforms = evaluate(&*route, 0.0);
        assert_eq!(uniforms.get_float("speed"), Some(0.0));
        assert_eq!(uniforms.get_texture("image").map(|t| t.as_str()), Some("arrows.png"));
        assert_eq!(uniforms.get_vec2("repeat"), Some(glam::Vec2::new(4.0, 1.0)));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.materials.is_empty());
        assert_eq!(config.clock.multiplier, 1.0);
    }

    #[test]
    fn unknown_material_type_is_rejected() {
        let err = parse_config("[materials.x]\ntype = \"lava\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn non_finite_keyframe_time_is_rejected() {
        let preset = r#"
[materials.river]
type = "water"
amplitude = { samples = [[10.0, 4.0], [nan, 1.0]] }
"#;
        let err = parse_config(preset).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/presets.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/presets.toml"));
    }
}
