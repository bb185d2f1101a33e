//! Per-frame render statistics

use super::primitives::CameraHandle;
use super::targets::Extent;

/// What one pass did during a frame
#[derive(Debug, Clone, PartialEq)]
pub struct PassRecord {
    /// Pass name
    pub name: &'static str,
    /// Camera the pass rendered with
    pub camera: CameraHandle,
    /// Extent of the targets the pass wrote
    pub extent: Extent,
    /// CPU time spent in the pass
    pub millis: f32,
}

/// Record of one `render()` call
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    /// Index of the frame
    pub frame_index: u64,
    /// Camera bound for the frame
    pub camera: CameraHandle,
    /// Target extent of the frame
    pub extent: Extent,
    /// Passes in execution order
    pub passes: Vec<PassRecord>,
    /// Whether the SSGI chain was active
    pub gi_active: bool,
}

impl FrameStats {
    /// Start an empty record
    pub fn new(frame_index: u64, camera: CameraHandle, extent: Extent, gi_active: bool) -> Self {
        Self {
            frame_index,
            camera,
            extent,
            passes: Vec::with_capacity(5),
            gi_active,
        }
    }

    /// Whether every pass used the frame's camera and extent
    pub fn is_consistent(&self) -> bool {
        self.passes
            .iter()
            .all(|pass| pass.camera == self.camera && pass.extent == self.extent)
    }

    /// Pass names in execution order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name).collect()
    }

    /// Total CPU time of all passes
    pub fn total_millis(&self) -> f32 {
        self.passes.iter().map(|pass| pass.millis).sum()
    }
}
