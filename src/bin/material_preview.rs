//! Material preview tool.
//!
//! Loads a preset file, advances a simulation clock and logs the uniforms
//! every instance would hand to its GPU program.
//!
//! ```bash
//! # Built-in materials with default parameters
//! material_preview
//!
//! # Ten frames of a preset at 30 fps, running time twice as fast
//! material_preview --config presets/demo.toml --frames 10 --dt 0.0333 --multiplier 2
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::time::Duration;

    use animated_materials::{
        global_registry, init, load_config, MaterialOptions, MaterialScene, PolylineFlowOptions,
        PreviewConfig, WallFlowOptions, WaterOptions,
    };
    use clap::Parser;

    /// Material preview arguments.
    #[derive(Parser, Debug)]
    #[command(
        name = "material_preview",
        about = "Evaluate animated materials over a few frames and log their uniforms"
    )]
    struct Args {
        /// TOML preset file; without it one instance of each built-in material is shown.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Number of frames to evaluate.
        #[arg(long, default_value_t = 3)]
        frames: u32,

        /// Wall-clock seconds between frames.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f64,

        /// Override the preset's clock multiplier.
        #[arg(long)]
        multiplier: Option<f64>,

        /// Also log the size of each packed uniform block.
        #[arg(long)]
        pack: bool,
    }

    fn builtin_preset() -> PreviewConfig {
        let mut config = PreviewConfig::default();
        config.materials.insert(
            "polyline".into(),
            MaterialOptions::PolylineFlow(PolylineFlowOptions::default()),
        );
        config
            .materials
            .insert("wall".into(), MaterialOptions::WallFlow(WallFlowOptions::default()));
        config
            .materials
            .insert("water".into(), MaterialOptions::Water(WaterOptions::default()));
        config
    }

    /// Wall-clock step between frames; rejects negative and non-finite values.
    fn frame_step(dt: f64) -> Result<Duration, String> {
        Duration::try_from_secs_f64(dt).map_err(|e| format!("Invalid --dt {dt}: {e}"))
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        init()?;

        let config = match &args.config {
            Some(path) => load_config(path)?,
            None => builtin_preset(),
        };

        let mut clock = config.clock.build();
        if let Some(multiplier) = args.multiplier {
            clock.multiplier = multiplier;
        }

        let mut scene = MaterialScene::new();
        let mut names = Vec::with_capacity(config.materials.len());
        for (name, options) in config.materials {
            let id = scene.insert_boxed(options.into_bundle());
            names.push((id, name));
        }

        let registry = global_registry().read();
        let step = frame_step(args.dt)?;
        let mut block = Vec::new();
        let mut time = clock.current;

        for frame in 0..args.frames {
            let stats = scene.render_frame(&registry, time, |material| {
                let name = names
                    .iter()
                    .find(|(id, _)| *id == material.instance)
                    .map_or("?", |(_, name)| name.as_str());
                let uniforms = material
                    .uniforms
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                log::info!(
                    "[frame {frame} t={:.3}] {name} ({}{}) {uniforms}",
                    time.seconds(),
                    material.descriptor.type_name(),
                    if material.translucent { ", translucent" } else { "" }
                );
                if args.pack {
                    material.descriptor.pack_uniforms(material.uniforms, &mut block);
                    log::info!("  uniform block: {} bytes", block.len());
                }
            });
            if stats.skipped > 0 {
                log::warn!("[frame {frame}] {} instances skipped", stats.skipped);
            }
            time = clock.tick(step);
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn frame_step_rejects_unusable_dt() {
            assert_eq!(frame_step(0.5), Ok(Duration::from_millis(500)));
            assert_eq!(frame_step(0.0), Ok(Duration::ZERO));
            for dt in [f64::INFINITY, f64::NAN, -1.0] {
                assert!(frame_step(dt).unwrap_err().contains("--dt"));
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
