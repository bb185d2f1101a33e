//! Edge-aware SSGI denoiser
//!
//! A joint bilateral blur of the GI/AO estimate. Every neighbour within
//! `radius` is sampled and weighted by a spatial Gaussian and by three edge-stopping
//! terms `exp(-phi * deviation)`:
//!
//! - luma: absolute luminance difference of the GI colour
//! - depth: depth difference relative to the centre depth
//! - normal: `1 - dot(n_centre, n_sample)`
//!
//! Larger `phi` values stop the blur at smaller deviations. Sky pixels are
//! copied through and never used as neighbours.
//!
//! Temporal accumulation is off by default. When enabled, the spatial result
//! is blended with the previous output; the history is dropped whenever the
//! targets are reallocated, the camera changes or GI is switched off.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec3};
use crate::render::graph::{Pass, PassContext};
use crate::render::primitives::CameraHandle;
use crate::render::targets::{Extent, RenderTargets, TargetSlot, FAR_DEPTH, NEUTRAL_GI_AO};
use crate::render::RenderResult;

/// Denoise parameter ranges exposed to control surfaces
pub mod ranges {
    /// Edge-stopping factors
    pub const PHI: (f32, f32) = (0.0, 100.0);
    /// Filter radius in pixels
    pub const RADIUS: (u32, u32) = (0, 16);
    /// Weight of the current frame in temporal blending
    pub const TEMPORAL_ALPHA: (f32, f32) = (0.01, 1.0);
}

/// Tunable denoise parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseParams {
    /// Luminance edge-stopping factor
    pub luma_phi: f32,
    /// Depth edge-stopping factor
    pub depth_phi: f32,
    /// Normal edge-stopping factor
    pub normal_phi: f32,
    /// Filter radius in pixels; zero copies the input
    pub radius: u32,
    /// Blend with the previous frame
    pub temporal: bool,
    /// Weight of the current frame when blending
    pub temporal_alpha: f32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            luma_phi: 5.0,
            depth_phi: 5.0,
            normal_phi: 5.0,
            radius: 4,
            temporal: false,
            temporal_alpha: 0.1,
        }
    }
}

impl DenoiseParams {
    /// Copy with every field clamped to its range
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let phi = |value: f32| utils::clamp(value, ranges::PHI.0, ranges::PHI.1);
        Self {
            luma_phi: phi(self.luma_phi),
            depth_phi: phi(self.depth_phi),
            normal_phi: phi(self.normal_phi),
            radius: self.radius.clamp(ranges::RADIUS.0, ranges::RADIUS.1),
            temporal: self.temporal,
            temporal_alpha: utils::clamp(self.temporal_alpha, ranges::TEMPORAL_ALPHA.0, ranges::TEMPORAL_ALPHA.1),
        }
    }
}

/// Spatial (and optionally temporal) GI/AO filter
#[derive(Debug, Default)]
pub struct DenoisePass {
    history: Vec<[f32; 4]>,
    history_valid: bool,
}

impl DenoisePass {
    /// Create the pass with empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a previous frame is available for temporal blending
    pub fn has_history(&self) -> bool {
        self.history_valid
    }

    fn reset_history(&mut self) {
        self.history.clear();
        self.history_valid = false;
    }
}

impl Pass for DenoisePass {
    fn name(&self) -> &'static str {
        "denoise"
    }

    fn reads(&self) -> &'static [TargetSlot] {
        &[TargetSlot::GiAo, TargetSlot::Depth, TargetSlot::Normal]
    }

    fn writes(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Denoised]
    }

    fn execute(&mut self, ctx: &PassContext<'_>, targets: &mut RenderTargets) -> RenderResult<()> {
        if !ctx.gi_active() {
            targets.denoised.fill(NEUTRAL_GI_AO);
            self.reset_history();
            return Ok(());
        }

        let params = ctx.denoise;
        let extent = targets.extent();
        let (input, depth, normal) = (&targets.gi_ao, &targets.depth, &targets.normal);
        let output = targets.denoised.texels_mut();

        if params.radius == 0 {
            output.copy_from_slice(input.texels());
        } else {
            let radius = params.radius as i32;
            let sigma = (params.radius as f32 * 0.5).max(0.5);
            let inv_two_sigma2 = 1.0 / (2.0 * sigma * sigma);

            for y in 0..extent.height {
                for x in 0..extent.width {
                    let index = y as usize * extent.width as usize + x as usize;
                    let center = input.get(x, y);
                    let center_depth = depth.get(x, y)[0];
                    if center_depth >= FAR_DEPTH {
                        output[index] = center;
                        continue;
                    }

                    let center_luma = utils::luminance(Vec3::new(center[0], center[1], center[2]));
                    let center_normal = texel_normal(normal.get(x, y));

                    let mut sum = [0.0_f32; 4];
                    let mut weight_sum = 0.0_f32;

                    for dy in -radius..=radius {
                        for dx in -radius..=radius {
                            let (sx, sy) = (x as i32 + dx, y as i32 + dy);
                            if let (Some(sample), Some(sample_depth)) = (input.try_get(sx, sy), depth.try_get(sx, sy)) {
                                let sample_depth = sample_depth[0];
                                if sample_depth < FAR_DEPTH {
                                    let spatial = (-((dx * dx + dy * dy) as f32) * inv_two_sigma2).exp();
                                    let luma = utils::luminance(Vec3::new(sample[0], sample[1], sample[2]));
                                    let luma_dev = (luma - center_luma).abs();
                                    let depth_dev = (sample_depth - center_depth).abs() / center_depth.max(1e-4);
                                    let normal_dev = normal
                                        .try_get(sx, sy)
                                        .map_or(1.0, |n| 1.0 - center_normal.dot(&texel_normal(n)).clamp(-1.0, 1.0));

                                    let weight = spatial
                                        * (-params.luma_phi * luma_dev).exp()
                                        * (-params.depth_phi * depth_dev).exp()
                                        * (-params.normal_phi * normal_dev).exp();

                                    for (acc, value) in sum.iter_mut().zip(sample) {
                                        *acc += value * weight;
                                    }
                                    weight_sum += weight;
                                }
                            }
                        }
                    }

                    output[index] = if weight_sum > 0.0 { sum.map(|c| c / weight_sum) } else { center };
                }
            }
        }

        if params.temporal {
            if self.history_valid && self.history.len() == output.len() {
                let alpha = params.temporal_alpha;
                for (current, previous) in output.iter_mut().zip(&self.history) {
                    for channel in 0..4 {
                        current[channel] = utils::lerp(previous[channel], current[channel], alpha);
                    }
                }
            }
            self.history.clear();
            self.history.extend_from_slice(output);
            self.history_valid = true;
        } else if self.history_valid {
            self.reset_history();
        }

        Ok(())
    }

    fn on_resize(&mut self, _extent: Extent) {
        self.reset_history();
    }

    fn on_camera_changed(&mut self, _camera: CameraHandle) {
        self.reset_history();
    }
}

fn texel_normal(texel: [f32; 4]) -> Vec3 {
    Vec3::new(texel[0], texel[1], texel[2])
}
