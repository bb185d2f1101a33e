//! # Animation and Frame Loop
//!
//! Everything that changes over time implements [`Animatable`]. The
//! [`FrameLoop`] ticks every registered animatable in registration order and
//! then renders, once per host frame.
//!
//! Ordering between animatables is a caller contract: anything deriving state
//! from the sun must be registered after the sun path and before the sky. The
//! loop makes no ordering decisions of its own.

pub mod frame_loop;
pub mod host;
pub mod registry;

pub use frame_loop::{FrameError, FrameLoop, FrameOutcome, FrameWorld, LoopState};
pub use host::{AnimationHost, CallbackId, HeadlessHost};
pub use registry::{AnimatableId, AnimatableRegistry};

use thiserror::Error;

use crate::controls::ControlPanel;
use crate::render::{ActiveCameraController, RenderError, RenderSettings};
use crate::scene::{Scene, SceneError};

/// Mutable world state handed to every animatable during a tick
///
/// Animatables receive explicit references instead of reaching into shared
/// globals. Parameters are read through `controls`; renderer-global state is
/// written through `settings` by whoever owns the relevant claim.
pub struct TickContext<'a> {
    /// Scene graph
    pub scene: &'a mut Scene,
    /// Cameras and the active camera handle
    pub cameras: &'a mut ActiveCameraController,
    /// Renderer-global settings
    pub settings: &'a mut RenderSettings,
    /// Externally mutable parameters
    pub controls: &'a mut ControlPanel,
    /// Index of the frame being simulated
    pub frame_index: u64,
}

/// Errors an animatable may raise from `tick`
#[derive(Error, Debug)]
pub enum TickError {
    /// A scene node the animatable relies on is gone
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Renderer state could not be updated
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Animatable-specific failure
    #[error("{0}")]
    Custom(String),
}

/// Anything advanced by elapsed time
pub trait Animatable {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        "animatable"
    }

    /// Advance by `delta` seconds
    fn tick(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError>;
}
