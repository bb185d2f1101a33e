//! # Rendering System
//!
//! The render core of the engine: a fixed graph of passes connected by
//! intermediate frame buffers, the camera store that passes read from, and
//! the surface-facing pieces that keep everything sized consistently.
//!
//! ## Architecture
//!
//! - **RenderPipeline**: owns the passes and the intermediate targets; `render`,
//!   `resize` and `set_camera` are its whole public surface
//! - **Passes**: scene capture (colour/depth/normal), SSGI estimation,
//!   edge-aware denoise, depth-gated composite and tone-mapped output
//! - **Cameras**: non-owning [`CameraHandle`]s into a [`CameraStore`], with
//!   [`ActiveCameraController`] as the single source of truth for the active view
//! - **SurfaceResizer**: propagates surface size changes to the active camera
//!   and the pipeline
//!
//! All pass kernels run on a deterministic CPU reference backend operating on
//! float RGBA buffers. The device itself is created by the host; the pipeline
//! only sees a [`DeviceCapabilities`] description of it.

pub mod primitives;
pub mod camera_controller;
pub mod device;
pub mod graph;
pub mod passes;
pub mod resizer;
pub mod settings;
pub mod stats;
pub mod surface;
pub mod targets;

pub use camera_controller::{ActiveCameraController, CameraBinding};
pub use device::{BackendKind, DeviceCapabilities};
pub use graph::{FrameInputs, Quality, RenderPipeline, ResizeOutcome};
pub use primitives::{Camera, CameraHandle, CameraStore, FrameCamera};
pub use resizer::SurfaceResizer;
pub use settings::{ExposureClaim, RenderSettings};
pub use stats::{FrameStats, PassRecord};
pub use surface::{HeadlessSurface, Surface};
pub use targets::{BufferId, Extent, FrameBuffer, RenderTargets, TargetSlot};

use thiserror::Error;

/// Errors produced by the render core
#[derive(Error, Debug)]
pub enum RenderError {
    /// Pipeline construction failed
    ///
    /// No partially constructed pipeline is ever returned.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// The device lacks a capability the pipeline requires
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// The pass graph or its parameters are inconsistent
    #[error("Invalid render configuration: {0}")]
    InvalidConfiguration(String),

    /// Two buffers of the same frame graph disagree on size
    ///
    /// This is a configuration error, never a transient condition.
    #[error("Frame buffer size mismatch: {0}")]
    ExtentMismatch(String),

    /// A pass ran before one of its declared inputs was produced
    #[error("Missing pass input: {0}")]
    MissingInput(String),

    /// A camera handle no longer resolves to a camera
    #[error("Camera is not bound or no longer exists: {0}")]
    StaleCamera(String),

    /// Render settings were written without owning them
    #[error("Render settings ownership violated: {0}")]
    SettingsOwnership(String),

    /// A pass failed while executing
    #[error("Pass '{pass}' failed: {reason}")]
    PassFailed {
        /// Name of the failing pass
        pass: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Writing a frame out of the renderer failed
    #[error("Frame export failed: {0}")]
    Export(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
