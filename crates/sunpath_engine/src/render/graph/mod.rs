//! Frame graph: pass trait and the pipeline that runs it

pub mod pass;
pub mod pipeline;

pub use pass::{Pass, PassContext};
pub use pipeline::{FrameInputs, Quality, RenderPipeline, ResizeOutcome};
