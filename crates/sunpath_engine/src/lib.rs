//! # Sunpath Engine
//!
//! A real-time outdoor scene renderer: a physically inspired sky, a sun placed
//! from geographic location and time of day, and screen-space global
//! illumination layered on a multi-target scene pass.
//!
//! ## Features
//!
//! - **Render graph**: scene capture, SSGI, edge-aware denoise, depth-gated
//!   composite and tone-mapped output, run in strict order every frame
//! - **Frame loop**: fixed-order animatable ticks followed by one render
//! - **Resize and camera rebind**: consistent targets and cameras across
//!   surface changes and viewpoint switches
//! - **Dynamic sky**: sky uniforms and exposure derived from the sun each frame
//! - **Reference backend**: deterministic CPU execution of every pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sunpath_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         engine.cameras.add_camera(Camera::default());
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut host = HeadlessHost::new(1000.0 / 60.0).with_frame_limit(10);
//!     let mut surface = HeadlessSurface::new(320, 240);
//!     Engine::run(config, &mut MyApp, &mut host, &mut surface)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod render;
pub mod scene;
pub mod sky;
pub mod sun;
pub mod animation;
pub mod controls;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{Animatable, AnimationHost, FrameLoop, HeadlessHost, TickContext, TickError},
        controls::{ControlPanel, LightingParams},
        core::config::{ApplicationConfig, EngineConfig, PipelineConfig},
        foundation::{
            math::{Mat4, Transform, Vec2, Vec3},
            time::{FrameTimer, Stopwatch},
        },
        render::{
            passes::{DenoiseParams, SsgiParams},
            ActiveCameraController, Camera, CameraBinding, CameraHandle, DeviceCapabilities, Extent, FrameBuffer,
            HeadlessSurface, Quality, RenderPipeline, RenderSettings, Surface, SurfaceResizer,
        },
        scene::{LoadedScene, Material, Node, NodeId, NodeKind, Scene, SceneLoader, Shape},
        sky::{DynamicSky, SkyParams},
        sun::{NoaaEphemeris, SunPath, SunPathParams},
        AppError, Application, Engine, EngineError,
    };
}

#[cfg(test)]
mod tests;
