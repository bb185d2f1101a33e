//! Screen-space global illumination
//!
//! Horizon-based estimate of ambient occlusion and one-bounce indirect light
//! from the colour, depth and normal targets of the current frame.
//!
//! For every pixel the pass marches `step_count` samples to both sides of the
//! pixel along `slice_count` screen-space directions covering half a turn,
//! up to the projection of the world-space `radius`. Each sample in the
//! pixel's normal hemisphere occludes and, weighted by the same cosine,
//! bounces its colour back. Samples more than `thickness` in front of the
//! receiver are rejected so thin objects do not shadow what lies behind them.
//!
//! Output layout: RGB is indirect light scaled by `gi_intensity`, A is the
//! ambient-occlusion visibility in `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec3};
use crate::render::graph::{Pass, PassContext};
use crate::render::targets::{RenderTargets, TargetSlot, FAR_DEPTH, NEUTRAL_GI_AO};
use crate::render::RenderResult;

/// SSGI parameter ranges exposed to control surfaces
pub mod ranges {
    /// World-space radius
    pub const RADIUS: (f32, f32) = (0.0, 50.0);
    /// Angular slices
    pub const SLICE_COUNT: (u32, u32) = (1, 4);
    /// Steps per slice side
    pub const STEP_COUNT: (u32, u32) = (1, 32);
    /// AO intensity
    pub const AO_INTENSITY: (f32, f32) = (0.0, 4.0);
    /// GI intensity
    pub const GI_INTENSITY: (f32, f32) = (0.0, 100.0);
    /// Thickness
    pub const THICKNESS: (f32, f32) = (0.01, 10.0);
}

/// Tunable SSGI parameters
///
/// Read once per frame. Out-of-range values are clamped, never rejected.
/// A radius of zero, or `enabled = false`, turns the whole SSGI chain off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsgiParams {
    /// Master switch
    pub enabled: bool,
    /// World-space sampling radius
    pub radius: f32,
    /// Number of angular slices
    pub slice_count: u32,
    /// Samples per slice side
    pub step_count: u32,
    /// Ambient-occlusion strength
    pub ao_intensity: f32,
    /// Indirect light strength
    pub gi_intensity: f32,
    /// Maximum depth a sample may sit in front of the receiver
    pub thickness: f32,
    /// Cheaper screen-space sampling instead of world-space-aware sampling
    pub use_screen_space_sampling: bool,
}

impl Default for SsgiParams {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 4.0,
            slice_count: 2,
            step_count: 8,
            ao_intensity: 1.0,
            gi_intensity: 2.0,
            thickness: 1.0,
            use_screen_space_sampling: true,
        }
    }
}

impl SsgiParams {
    /// Copy with every field clamped; a disabled set gets a zero radius
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let clamp = |value: f32, (min, max): (f32, f32)| utils::clamp(value, min, max);
        let radius = if self.enabled { clamp(self.radius, ranges::RADIUS) } else { 0.0 };

        Self {
            enabled: self.enabled,
            radius,
            slice_count: self.slice_count.clamp(ranges::SLICE_COUNT.0, ranges::SLICE_COUNT.1),
            step_count: self.step_count.clamp(ranges::STEP_COUNT.0, ranges::STEP_COUNT.1),
            ao_intensity: clamp(self.ao_intensity, ranges::AO_INTENSITY),
            gi_intensity: clamp(self.gi_intensity, ranges::GI_INTENSITY),
            thickness: clamp(self.thickness, ranges::THICKNESS),
            use_screen_space_sampling: self.use_screen_space_sampling,
        }
    }

    /// Whether the chain contributes anything
    pub fn is_active(&self) -> bool {
        self.enabled && self.radius > 0.0
    }
}

/// Interleaved gradient noise in `[0, 1)`
fn interleaved_gradient_noise(x: u32, y: u32, frame: u64) -> f32 {
    let offset = (frame % 64) as f32 * 5.588_238;
    let (fx, fy) = (x as f32 + offset, y as f32 + offset);
    (52.982_918 * (0.067_110_56 * fx + 0.005_837_15 * fy).fract()).fract()
}

/// SSGI estimation pass
#[derive(Debug, Default)]
pub struct SsgiPass;

impl SsgiPass {
    /// Create the pass
    pub fn new() -> Self {
        Self
    }
}

impl Pass for SsgiPass {
    fn name(&self) -> &'static str {
        "ssgi"
    }

    fn reads(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Color, TargetSlot::Depth, TargetSlot::Normal]
    }

    fn writes(&self) -> &'static [TargetSlot] {
        &[TargetSlot::GiAo]
    }

    fn execute(&mut self, ctx: &PassContext<'_>, targets: &mut RenderTargets) -> RenderResult<()> {
        if !ctx.gi_active() {
            targets.gi_ao.fill(NEUTRAL_GI_AO);
            return Ok(());
        }

        let params = ctx.ssgi;
        let camera = ctx.camera;
        let extent = targets.extent();
        let (color, depth, normal) = (&targets.color, &targets.depth, &targets.normal);
        let output = targets.gi_ao.texels_mut();

        let slices = params.slice_count.max(1);
        let steps = params.step_count.max(1);
        let samples_per_pixel = (slices * steps * 2) as f32;

        for y in 0..extent.height {
            for x in 0..extent.width {
                let index = y as usize * extent.width as usize + x as usize;
                let d = depth.get(x, y)[0];
                if d >= FAR_DEPTH {
                    output[index] = NEUTRAL_GI_AO;
                    continue;
                }

                let p = camera.view_position(x as f32, y as f32, d, extent);
                let n = {
                    let t = normal.get(x, y);
                    Vec3::new(t[0], t[1], t[2])
                };
                let radius_px = params.radius * camera.pixels_per_unit(-p.z, extent);
                if radius_px < 1.0 {
                    output[index] = NEUTRAL_GI_AO;
                    continue;
                }

                let noise = interleaved_gradient_noise(x, y, ctx.frame_index);
                let mut occlusion = 0.0_f32;
                let mut bounce = Vec3::zeros();

                for slice in 0..slices {
                    let phi = (slice as f32 + noise) / slices as f32 * std::f32::consts::PI;
                    let (dir_y, dir_x) = phi.sin_cos();

                    for side in [-1.0_f32, 1.0] {
                        for step in 0..steps {
                            let t = (step as f32 + 0.5 * (1.0 + noise)) / steps as f32;
                            let offset = radius_px * if params.use_screen_space_sampling { t } else { t * t };

                            let sx = (x as f32 + side * dir_x * offset).round() as i32;
                            let sy = (y as f32 - side * dir_y * offset).round() as i32;
                            if sx == x as i32 && sy == y as i32 {
                                continue;
                            }
                            let Some(sample_depth) = depth.try_get(sx, sy).map(|t| t[0]) else { continue };
                            if sample_depth >= FAR_DEPTH {
                                continue;
                            }

                            let s = camera.view_position(sx as f32, sy as f32, sample_depth, extent);
                            let v = s - p;
                            let dist = v.norm();
                            if dist <= f32::EPSILON || dist > params.radius {
                                continue;
                            }
                            if s.z - p.z > params.thickness {
                                continue;
                            }

                            let v = v / dist;
                            let cos = n.dot(&v);
                            if cos <= 0.0 {
                                continue;
                            }

                            let falloff = if params.use_screen_space_sampling {
                                1.0 - offset / radius_px
                            } else {
                                1.0 - (dist / params.radius).powi(2)
                            }
                            .max(0.0);

                            let weight = cos * falloff;
                            occlusion += weight;

                            let emitter = if params.use_screen_space_sampling {
                                1.0
                            } else {
                                let t = normal.get(sx as u32, sy as u32);
                                Vec3::new(t[0], t[1], t[2]).dot(&-v).max(0.0)
                            };
                            let c = color.get(sx as u32, sy as u32);
                            bounce += Vec3::new(c[0], c[1], c[2]) * (weight * emitter);
                        }
                    }
                }

                let visibility = utils::clamp(1.0 - occlusion / samples_per_pixel * params.ao_intensity, 0.0, 1.0);
                let gi = bounce / samples_per_pixel * params.gi_intensity;
                output[index] = [gi.x, gi.y, gi.z, visibility];
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_means_zero_radius() {
        let params = SsgiParams {
            enabled: false,
            ..SsgiParams::default()
        };
        let effective = params.sanitized();

        assert_eq!(effective.radius, 0.0);
        assert!(!effective.is_active());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = SsgiParams {
            radius: 500.0,
            slice_count: 0,
            step_count: 99,
            ao_intensity: -1.0,
            gi_intensity: f32::INFINITY,
            thickness: 0.0,
            ..SsgiParams::default()
        }
        .sanitized();

        assert_eq!(params.radius, 50.0);
        assert_eq!(params.slice_count, 1);
        assert_eq!(params.step_count, 32);
        assert_eq!(params.ao_intensity, 0.0);
        assert_eq!(params.gi_intensity, 100.0);
        assert_eq!(params.thickness, 0.01);
    }

    #[test]
    fn test_noise_range() {
        for y in 0..16 {
            for x in 0..16 {
                let n = interleaved_gradient_noise(x, y, 3);
                assert!((0.0..1.0).contains(&n));
            }
        }
    }
}
