//! Sun-path house demo
//!
//! Renders a procedural house under a dynamic sky with a flock of birds,
//! headless. Midway through the run the view switches from the orbiting bird
//! camera to the first-person camera and the window is resized. The last
//! presented frame is written to a PNG.
//!
//! Usage: `house_demo [config.toml|config.ron] [output.png]`

mod birds;
mod house;
mod rig;
mod surface;

use std::f32::consts::TAU;
use std::path::PathBuf;

use rand::prelude::*;
use rand::rngs::StdRng;
use thiserror::Error;

use sunpath_engine::animation::{FrameOutcome, HeadlessHost};
use sunpath_engine::config::{Config, ConfigError};
use sunpath_engine::core::ApplicationConfig;
use sunpath_engine::foundation::math::Vec3;
use sunpath_engine::render::{Camera, CameraHandle, Surface};
use sunpath_engine::scene::{Node, NodeKind};
use sunpath_engine::sky::DynamicSky;
use sunpath_engine::sun::{NoaaEphemeris, SunPath};
use sunpath_engine::{AppError, Application, Engine, EngineError};

use birds::{Bird, FlockTween};
use house::HouseLoader;
use rig::OrbitRig;
use surface::ScriptedSurface;

// Demo script
const FRAMES: u64 = 90;
const SWITCH_CAMERA_AT: u64 = 45;
const RESIZE_AT: u64 = 60;

const BIRD_COUNT: usize = 12;
const SEED: u64 = 0x5eed;
const FLOCK_DESTINATION: (f32, f32) = (100.0, 120.0);
const ORBIT_DEGREES_PER_SECOND: f32 = 6.0;

struct HouseApp {
    output: PathBuf,
    first_person: Option<CameraHandle>,
}

impl HouseApp {
    fn new(output: PathBuf) -> Self {
        Self {
            output,
            first_person: None,
        }
    }
}

impl Application for HouseApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let pipeline = &engine.config().pipeline;
        let aspect = pipeline.width as f32 / pipeline.height as f32;
        let look_at = Vec3::new(0.0, 2.0, 0.0);

        // The first camera added becomes the active one
        let mut bird_view = Camera::perspective(Vec3::new(-22.0, 14.0, 26.0), 50.0, aspect, 0.1, 500.0);
        bird_view.set_target(look_at);
        engine.cameras.add_camera(bird_view);

        let mut first_person = Camera::perspective(Vec3::new(6.0, 1.7, 8.0), 75.0, aspect, 0.1, 500.0);
        first_person.set_target(look_at);
        self.first_person = Some(engine.cameras.add_camera(first_person));

        let mut loader = HouseLoader::new(SEED, BIRD_COUNT).with_base_y(engine.controls.sun.base_y);
        let loaded = engine.load_scene(&mut loader)?;
        let ambient = engine.scene.add(Node::new(
            "ambient",
            NodeKind::AmbientLight {
                color: Vec3::new(1.0, 1.0, 1.0),
                intensity: engine.controls.lighting.ambient_intensity,
            },
        ));

        // Sun before sky: the sky reads the sun position written this frame
        engine.register_animatable(Box::new(OrbitRig::new(ORBIT_DEGREES_PER_SECOND)));
        let sun = SunPath::new(&mut engine.scene, &engine.controls.sun, Box::new(NoaaEphemeris))?.with_ambient(ambient);
        let sky = DynamicSky::new(&mut engine.scene, &mut engine.settings, sun.sun_node(), sun.marker_node())
            .map_err(|e| AppError::Custom(format!("Dynamic sky: {e}")))?;
        engine.register_animatable(Box::new(sun));
        engine.register_animatable(Box::new(sky));

        let mut rng = StdRng::seed_from_u64(SEED);
        for node in &loaded.birds {
            let bird = Bird::new(&engine.scene, *node, rng.gen_range(0.0..TAU), rng.gen_range(1.5..3.0))?;
            engine.register_animatable(Box::new(bird));
        }
        let (x, z) = FLOCK_DESTINATION;
        engine.register_animatable(Box::new(FlockTween::new(&engine.scene, loaded.flock, x, z)?));

        log::info!("House demo ready: {} birds, {} scene nodes", loaded.birds.len(), engine.scene.len());
        Ok(())
    }

    fn after_frame(
        &mut self,
        engine: &mut Engine,
        _surface: &mut dyn Surface,
        outcome: &FrameOutcome,
    ) -> Result<(), AppError> {
        if outcome.frame_index == SWITCH_CAMERA_AT {
            if let Some(first_person) = self.first_person {
                log::info!("Switching to the first-person camera");
                engine.switch_camera(first_person)?;
            }
        }

        if outcome.frame_index % 30 == 0 {
            if let Some(stats) = engine.pipeline().and_then(|pipeline| pipeline.last_stats()) {
                log::info!(
                    "Frame {}: {} at {:.1} ms (gi {})",
                    stats.frame_index,
                    stats.extent,
                    stats.total_millis(),
                    if stats.gi_active { "on" } else { "off" }
                );
            }
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let Some(frame) = engine.presented_frame() else {
            log::warn!("No frame was presented; nothing to save");
            return;
        };

        match frame.save_png(&self.output) {
            Ok(()) => log::info!("Saved {} to {}", frame.extent(), self.output.display()),
            Err(e) => log::error!("Failed to save {}: {e}", self.output.display()),
        }
    }
}

#[derive(Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

fn demo_config() -> ApplicationConfig {
    let mut config = ApplicationConfig::default();
    config.pipeline = config.pipeline.with_size(320, 180);
    config
}

fn main() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => demo_config(),
    };
    let output = args.next().map_or_else(|| PathBuf::from("house_frame.png"), PathBuf::from);

    let (width, height) = (config.pipeline.width, config.pipeline.height);
    let mut surface = ScriptedSurface::new(width, height)
        .with_pixel_ratio(config.pipeline.pixel_ratio)
        .resize_at(RESIZE_AT, width * 3 / 2, height * 3 / 2);
    let mut host = HeadlessHost::new(config.engine.frame_interval_ms).with_frame_limit(FRAMES);

    let mut app = HouseApp::new(output);
    Engine::run(config, &mut app, &mut host, &mut surface)?;

    log::info!("Surface ended at {}", surface.backing_size());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_run_resizes_and_saves_last_frame() {
        let mut config = demo_config();
        config.pipeline = config.pipeline.with_size(16, 9);
        config.ssgi.slice_count = 1;
        config.ssgi.step_count = 2;
        config.denoise.radius = 1;

        let output = std::env::temp_dir().join(format!("house_demo_{}.png", std::process::id()));
        let mut surface = ScriptedSurface::new(16, 9).resize_at(RESIZE_AT, 24, 12);
        let mut host = HeadlessHost::new(1000.0 / 60.0).with_frame_limit(RESIZE_AT + 1);
        let mut app = HouseApp::new(output.clone());

        Engine::run(config, &mut app, &mut host, &mut surface).unwrap();

        assert!(app.first_person.is_some());
        assert_eq!(surface.backing_size(), sunpath_engine::render::Extent::new(24, 12));
        assert!(output.exists());
        std::fs::remove_file(output).unwrap();
    }
}
