//! Render pass trait and execution context

use crate::render::passes::{DenoiseParams, SsgiParams};
use crate::render::primitives::{CameraHandle, FrameCamera};
use crate::render::settings::RenderSettings;
use crate::render::targets::{Extent, RenderTargets, TargetSlot};
use crate::render::RenderResult;
use crate::scene::Scene;

/// Render pass trait - implemented by every stage of the frame graph
pub trait Pass {
    /// Unique name for this pass
    fn name(&self) -> &'static str;

    /// Targets this pass samples
    ///
    /// Checked once at graph construction: every read must be written by an
    /// earlier pass.
    fn reads(&self) -> &'static [TargetSlot];

    /// Targets this pass writes
    fn writes(&self) -> &'static [TargetSlot];

    /// Execute the pass for one frame
    fn execute(&mut self, ctx: &PassContext<'_>, targets: &mut RenderTargets) -> RenderResult<()>;

    /// Intermediate targets were reallocated at `extent`
    fn on_resize(&mut self, _extent: Extent) {}

    /// A different camera will be used from the next frame on
    fn on_camera_changed(&mut self, _camera: CameraHandle) {}
}

/// Per-frame state shared by every pass of one `render()` call
///
/// Built once per frame, so every pass observes the same camera snapshot and
/// the same parameter values.
pub struct PassContext<'a> {
    /// Camera snapshot of this frame
    pub camera: &'a FrameCamera,
    /// Scene as it is at render time
    pub scene: &'a Scene,
    /// Renderer-global settings
    pub settings: &'a RenderSettings,
    /// Effective SSGI parameters (clamped and quality-adjusted)
    pub ssgi: &'a SsgiParams,
    /// Effective denoise parameters
    pub denoise: &'a DenoiseParams,
    /// Index of the frame being rendered
    pub frame_index: u64,
}

impl PassContext<'_> {
    /// Whether the SSGI chain contributes anything this frame
    pub fn gi_active(&self) -> bool {
        self.ssgi.is_active()
    }
}
