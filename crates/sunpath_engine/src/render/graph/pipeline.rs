//! Render pipeline
//!
//! Owns the pass sequence and every intermediate target. One `render()` call
//! runs each pass once, in order, against a single camera snapshot and a
//! single set of effective parameters.

use serde::{Deserialize, Serialize};

use crate::controls::ControlPanel;
use crate::foundation::time::Stopwatch;
use crate::render::camera_controller::CameraBinding;
use crate::render::device::DeviceCapabilities;
use crate::render::graph::{Pass, PassContext};
use crate::render::passes::{default_passes, SsgiParams};
use crate::render::primitives::{CameraHandle, CameraStore, FrameCamera};
use crate::render::settings::RenderSettings;
use crate::render::stats::{FrameStats, PassRecord};
use crate::render::targets::{Extent, FrameBuffer, RenderTargets, TargetSlot};
use crate::render::{RenderError, RenderResult};
use crate::scene::Scene;

/// Hardware quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    /// Parameters as configured
    #[default]
    Desktop,
    /// Fewer SSGI slices and steps for constrained hardware
    Mobile,
}

impl Quality {
    /// Maximum slices on mobile
    pub const MOBILE_MAX_SLICES: u32 = 1;
    /// Maximum steps on mobile
    pub const MOBILE_MAX_STEPS: u32 = 4;

    /// Preset from a mobile flag
    pub fn from_mobile(mobile: bool) -> Self {
        if mobile { Self::Mobile } else { Self::Desktop }
    }

    /// Apply the preset's cost limits to a parameter set
    pub fn apply(self, mut params: SsgiParams) -> SsgiParams {
        if self == Self::Mobile {
            params.slice_count = params.slice_count.min(Self::MOBILE_MAX_SLICES);
            params.step_count = params.step_count.min(Self::MOBILE_MAX_STEPS);
        }
        params
    }
}

/// Everything outside the pipeline that one frame reads
pub struct FrameInputs<'a> {
    /// Scene contents at render time
    pub scene: &'a Scene,
    /// Cameras the bound handle resolves against
    pub cameras: &'a CameraStore,
    /// Renderer-global settings
    pub settings: &'a RenderSettings,
    /// Tunable parameters, polled once per frame
    pub controls: &'a ControlPanel,
}

/// Result of a resize request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Targets were reallocated at the new extent
    Reallocated(Extent),
    /// Same extent as before; nothing was touched
    Unchanged,
    /// Invalid extent; previous targets were kept
    Rejected,
}

/// The frame graph and its intermediate targets
pub struct RenderPipeline {
    caps: DeviceCapabilities,
    quality: Quality,
    camera: CameraHandle,
    pending_camera: Option<CameraHandle>,
    targets: RenderTargets,
    passes: Vec<Box<dyn Pass>>,
    frame_index: u64,
    last_stats: Option<FrameStats>,
}

impl RenderPipeline {
    /// Build the standard pipeline
    pub fn new(caps: DeviceCapabilities, camera: CameraHandle, extent: Extent, quality: Quality) -> RenderResult<Self> {
        Self::with_passes(caps, camera, extent, quality, default_passes())
    }

    /// Build a pipeline from an explicit pass sequence
    ///
    /// Fails without returning a partial pipeline when the extent is invalid,
    /// the device cannot host the targets, or a pass reads a target no
    /// earlier pass writes.
    pub fn with_passes(
        caps: DeviceCapabilities,
        camera: CameraHandle,
        extent: Extent,
        quality: Quality,
        passes: Vec<Box<dyn Pass>>,
    ) -> RenderResult<Self> {
        if !extent.is_valid() {
            return Err(RenderError::InitializationFailed(format!("invalid initial extent {extent}")));
        }
        caps.validate_for(extent)?;
        validate_graph(&passes)?;

        caps.log_backend();
        log::info!(
            "Render pipeline created: {} passes at {extent} ({quality:?})",
            passes.len()
        );

        Ok(Self {
            caps,
            quality,
            camera,
            pending_camera: None,
            targets: RenderTargets::new(extent),
            passes,
            frame_index: 0,
            last_stats: None,
        })
    }

    /// Render one frame and return the presented image
    pub fn render(&mut self, inputs: &FrameInputs<'_>) -> RenderResult<&FrameBuffer> {
        if let Some(next) = self.pending_camera.take() {
            if next != self.camera {
                self.camera = next;
                for pass in &mut self.passes {
                    pass.on_camera_changed(next);
                }
                log::debug!("Pipeline camera rebound to {next:?}");
            }
        }

        let camera = inputs
            .cameras
            .get(self.camera)
            .ok_or_else(|| RenderError::StaleCamera(format!("pipeline camera {:?} does not resolve", self.camera)))?;
        let snapshot = FrameCamera::capture(self.camera, camera);

        self.targets.ensure_consistent()?;

        let ssgi = self.quality.apply(inputs.controls.ssgi.sanitized());
        let denoise = inputs.controls.denoise.sanitized();
        let ctx = PassContext {
            camera: &snapshot,
            scene: inputs.scene,
            settings: inputs.settings,
            ssgi: &ssgi,
            denoise: &denoise,
            frame_index: self.frame_index,
        };

        let extent = self.targets.extent();
        let mut stats = FrameStats::new(self.frame_index, snapshot.handle, extent, ctx.gi_active());
        for pass in &mut self.passes {
            let stopwatch = Stopwatch::start_new();
            pass.execute(&ctx, &mut self.targets).map_err(|e| match e {
                RenderError::PassFailed { .. } => e,
                other => RenderError::PassFailed {
                    pass: pass.name(),
                    reason: other.to_string(),
                },
            })?;
            stats.passes.push(PassRecord {
                name: pass.name(),
                camera: ctx.camera.handle,
                extent: self.targets.extent(),
                millis: stopwatch.elapsed_millis(),
            });
        }

        log::trace!(
            "Frame {} rendered at {extent} in {:.2} ms",
            self.frame_index,
            stats.total_millis()
        );
        self.last_stats = Some(stats);
        self.frame_index += 1;

        Ok(self.targets.get(TargetSlot::Output))
    }

    /// Whether `resize` would take this extent
    pub fn accepts(&self, extent: Extent) -> bool {
        extent.is_valid() && self.caps.fits(extent)
    }

    /// Resize every intermediate target
    ///
    /// Identical sizes are a no-op. Zero or oversized extents are rejected and
    /// the previous targets stay in place.
    pub fn resize(&mut self, width: u32, height: u32) -> ResizeOutcome {
        let extent = Extent::new(width, height);
        if !self.accepts(extent) {
            log::warn!("Ignoring resize to {extent}; keeping {}", self.targets.extent());
            return ResizeOutcome::Rejected;
        }
        if !self.targets.reallocate(extent) {
            return ResizeOutcome::Unchanged;
        }

        for pass in &mut self.passes {
            pass.on_resize(extent);
        }
        log::info!("Render targets reallocated at {extent}");
        ResizeOutcome::Reallocated(extent)
    }

    /// Rebind the camera; takes effect on the next `render()`
    pub fn set_camera(&mut self, camera: CameraHandle) {
        self.pending_camera = Some(camera);
    }

    /// Camera used by the last (or next, if none pending) frame
    pub fn camera(&self) -> CameraHandle {
        self.camera
    }

    /// Camera queued for the next frame
    pub fn pending_camera(&self) -> Option<CameraHandle> {
        self.pending_camera
    }

    /// Current target extent
    pub fn extent(&self) -> Extent {
        self.targets.extent()
    }

    /// Intermediate targets (read-only)
    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    /// Statistics of the last rendered frame
    pub fn last_stats(&self) -> Option<&FrameStats> {
        self.last_stats.as_ref()
    }

    /// Active quality preset
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    /// Names of the passes in execution order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }
}

impl CameraBinding for RenderPipeline {
    fn binding_name(&self) -> &'static str {
        "render-pipeline"
    }

    fn bind_camera(&mut self, handle: CameraHandle) {
        self.set_camera(handle);
    }
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("quality", &self.quality)
            .field("camera", &self.camera)
            .field("extent", &self.targets.extent())
            .field("passes", &self.pass_names())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

/// Every read must be produced by an earlier pass
fn validate_graph(passes: &[Box<dyn Pass>]) -> RenderResult<()> {
    if passes.is_empty() {
        return Err(RenderError::InvalidConfiguration("pipeline has no passes".to_string()));
    }

    let mut written: Vec<TargetSlot> = Vec::new();
    for pass in passes {
        if let Some(missing) = pass.reads().iter().find(|slot| !written.contains(slot)) {
            return Err(RenderError::MissingInput(format!(
                "pass '{}' reads {} before any pass writes it",
                pass.name(),
                missing.label()
            )));
        }
        written.extend_from_slice(pass.writes());
    }
    Ok(())
}
