//! Output pass: exposure, ACES tone mapping and sRGB encoding

use crate::render::graph::{Pass, PassContext};
use crate::render::targets::{RenderTargets, TargetSlot};
use crate::render::RenderResult;

/// Narkowicz fit of the ACES filmic curve
pub fn aces_filmic(x: f32) -> f32 {
    const A: f32 = 2.51;
    const B: f32 = 0.03;
    const C: f32 = 2.43;
    const D: f32 = 0.59;
    const E: f32 = 0.14;
    let x = x.max(0.0);
    ((x * (A * x + B)) / (x * (C * x + D) + E)).clamp(0.0, 1.0)
}

/// Linear to sRGB transfer function
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Final display transform
#[derive(Debug, Default)]
pub struct OutputPass;

impl OutputPass {
    /// Create the pass
    pub fn new() -> Self {
        Self
    }
}

impl Pass for OutputPass {
    fn name(&self) -> &'static str {
        "output"
    }

    fn reads(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Composite]
    }

    fn writes(&self) -> &'static [TargetSlot] {
        &[TargetSlot::Output]
    }

    fn execute(&mut self, ctx: &PassContext<'_>, targets: &mut RenderTargets) -> RenderResult<()> {
        let exposure = ctx.settings.tone_mapping_exposure();
        let input = targets.composite.texels();
        let output = targets.output.texels_mut();

        for (out, c) in output.iter_mut().zip(input) {
            let map = |v: f32| linear_to_srgb(aces_filmic(v * exposure));
            *out = [map(c[0]), map(c[1]), map(c[2]), 1.0];
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aces_endpoints() {
        assert_eq!(aces_filmic(0.0), 0.0);
        assert_eq!(aces_filmic(-3.0), 0.0);
        assert_eq!(aces_filmic(1000.0), 1.0);
        assert!(aces_filmic(0.5) < aces_filmic(1.0));
    }

    #[test]
    fn test_srgb_curve() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert_relative_eq!(linear_to_srgb(1.0), 1.0, epsilon = 1e-5);
        assert_relative_eq!(linear_to_srgb(0.5), 0.735_356_6, epsilon = 1e-4);
    }
}
