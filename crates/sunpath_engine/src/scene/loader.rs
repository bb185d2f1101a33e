//! Scene-loading collaborator interface
//!
//! Loading and authoring formats live outside the engine. A loader hands
//! back fully built nodes; the engine only adds them to the scene and lets
//! the application register the animated ones.

use super::{NodeId, Scene, SceneError};

/// Nodes produced by a [`SceneLoader`]
#[derive(Debug, Clone)]
pub struct LoadedScene {
    /// Root of the static house structure
    pub house: NodeId,
    /// Group holding every bird
    pub flock: NodeId,
    /// Individually animatable birds, children of `flock`
    pub birds: Vec<NodeId>,
}

/// Supplies the house and the birds once loading completes
pub trait SceneLoader {
    /// Build the nodes into `scene`
    fn load(&mut self, scene: &mut Scene) -> Result<LoadedScene, SceneError>;
}
