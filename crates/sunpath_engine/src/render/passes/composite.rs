//! GI composite pass
//!
//! Combines the lit scene colour with the denoised GI/AO estimate:
//! `rgb = base.rgb * visibility + gi.rgb`. Sky pixels, and every pixel while
//! the SSGI chain is off, are copied through untouched so the output equals
//! the scene render exactly.

use crate::render::graph::{Pass, PassContext};
use crate::render::targets::{RenderTargets, TargetSlot, FAR_DEPTH};
use crate::render::RenderResult;

/// Base colour plus indirect light
#[derive(Debug, Default)]
pub struct CompositePass;

impl CompositePass {
    /// Create the pass
    pub fn new() -> Self {
        Self
    }
}

impl Pass for CompositePass {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn reads(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Color, TargetSlot::Denoised, TargetSlot::Depth]
    }

    fn writes(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Composite]
    }

    fn execute(&mut self, ctx: &PassContext<'_>, targets: &mut RenderTargets) -> RenderResult<()> {
        let base = targets.color.texels();
        let output = targets.composite.texels_mut();

        if !ctx.gi_active() {
            output.copy_from_slice(base);
            return Ok(());
        }

        let gi = targets.denoised.texels();
        let depth = targets.depth.texels();
        for (((out, base), gi), depth) in output.iter_mut().zip(base).zip(gi).zip(depth) {
            *out = if depth[0] >= FAR_DEPTH {
                *base
            } else {
                let visibility = gi[3];
                [
                    base[0] * visibility + gi[0],
                    base[1] * visibility + gi[1],
                    base[2] * visibility + gi[2],
                    1.0,
                ]
            };
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::passes::{DenoiseParams, SsgiParams};
    use crate::render::primitives::{Camera, CameraStore, FrameCamera};
    use crate::render::settings::RenderSettings;
    use crate::render::targets::{BufferId, Extent, FrameBuffer};
    use crate::scene::Scene;

    fn run(ssgi: SsgiParams, targets: &mut RenderTargets) {
        let mut store = CameraStore::new();
        let handle = store.insert(Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0));
        let camera = FrameCamera::capture(handle, store.get(handle).unwrap());
        let scene = Scene::new();
        let settings = RenderSettings::new();
        let denoise = DenoiseParams::default();
        let ctx = PassContext {
            camera: &camera,
            scene: &scene,
            settings: &settings,
            ssgi: &ssgi,
            denoise: &denoise,
            frame_index: 0,
        };
        CompositePass::new().execute(&ctx, targets).unwrap();
    }

    fn targets_with(depth: f32) -> RenderTargets {
        let extent = Extent::new(2, 2);
        let mut targets = RenderTargets::new(extent);
        targets.replace_for_test(TargetSlot::Color, FrameBuffer::new(BufferId(200), "c", extent, [0.4, 0.6, 0.8, 1.0]));
        targets.replace_for_test(TargetSlot::Denoised, FrameBuffer::new(BufferId(201), "g", extent, [0.1, 0.2, 0.3, 0.5]));
        targets.replace_for_test(TargetSlot::Depth, FrameBuffer::new(BufferId(202), "d", extent, [depth, 0.0, 0.0, 1.0]));
        targets
    }

    #[test]
    fn test_geometry_gets_occlusion_and_bounce() {
        let mut targets = targets_with(0.2);
        run(SsgiParams::default(), &mut targets);

        let out = targets.get(TargetSlot::Composite).get(0, 0);
        assert_eq!(out, [0.4 * 0.5 + 0.1, 0.6 * 0.5 + 0.2, 0.8 * 0.5 + 0.3, 1.0]);
    }

    #[test]
    fn test_sky_passes_through() {
        let mut targets = targets_with(FAR_DEPTH);
        run(SsgiParams::default(), &mut targets);

        assert_eq!(targets.get(TargetSlot::Composite).bits(), targets.get(TargetSlot::Color).bits());
    }

    #[test]
    fn test_disabled_chain_copies_base() {
        let mut targets = targets_with(0.2);
        let ssgi = SsgiParams {
            enabled: false,
            ..SsgiParams::default()
        }
        .sanitized();
        run(ssgi, &mut targets);

        assert_eq!(targets.get(TargetSlot::Composite).bits(), targets.get(TargetSlot::Color).bits());
    }
}
