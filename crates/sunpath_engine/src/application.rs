//! Application trait and lifecycle management

use thiserror::Error;

use crate::animation::FrameOutcome;
use crate::engine::{Engine, EngineError};
use crate::render::Surface;
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to build a scene on top of the engine.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the engine is created and before the pipeline is
    /// attached. Add cameras, nodes and animatables here; the first camera
    /// added becomes the active one.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called after every processed frame
    ///
    /// The place for application-driven events such as camera switches or
    /// simulated surface resizes.
    fn after_frame(
        &mut self,
        _engine: &mut Engine,
        _surface: &mut dyn Surface,
        _outcome: &FrameOutcome,
    ) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called once when the loop has stopped.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene construction failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
