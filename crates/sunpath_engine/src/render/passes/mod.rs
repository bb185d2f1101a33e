//! Render passes
//!
//! The fixed frame graph, in execution order:
//!
//! 1. [`SceneCapturePass`] - colour, depth and normal
//! 2. [`SsgiPass`] - noisy GI/AO estimate
//! 3. [`DenoisePass`] - edge-aware filter of the estimate
//! 4. [`CompositePass`] - depth-gated merge with the base colour
//! 5. [`OutputPass`] - exposure and tone mapping

pub mod composite;
pub mod denoise;
pub mod output;
pub mod scene_capture;
pub mod ssgi;

pub use composite::CompositePass;
pub use denoise::{DenoiseParams, DenoisePass};
pub use output::OutputPass;
pub use scene_capture::SceneCapturePass;
pub use ssgi::{SsgiParams, SsgiPass};

use crate::render::graph::Pass;

/// The standard pass sequence
pub fn default_passes() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(SceneCapturePass::new()),
        Box::new(SsgiPass::new()),
        Box::new(DenoisePass::new()),
        Box::new(CompositePass::new()),
        Box::new(OutputPass::new()),
    ]
}
