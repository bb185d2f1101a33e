//! Physically inspired sky
//!
//! [`SkyParams`] is the externally mutable parameter set, [`SkyUniforms`] the
//! state of one sky node, and [`DynamicSky`] the animatable deriving the
//! latter from the former plus the sun's transform every frame.

pub mod dynamic_sky;
pub mod sky_model;

pub use dynamic_sky::DynamicSky;
pub use sky_model::{SkyUniforms, SKY_DOME_SCALE};

use serde::{Deserialize, Serialize};

use crate::foundation::math::utils;

/// Sky parameter ranges exposed to control surfaces
pub mod ranges {
    /// Turbidity range
    pub const TURBIDITY: (f32, f32) = (0.0, 20.0);
    /// Rayleigh coefficient range
    pub const RAYLEIGH: (f32, f32) = (0.0, 4.0);
    /// Mie coefficient range
    pub const MIE_COEFFICIENT: (f32, f32) = (0.0, 0.1);
    /// Mie directional-g range
    pub const MIE_DIRECTIONAL_G: (f32, f32) = (0.0, 1.0);
    /// Exposure range
    pub const EXPOSURE: (f32, f32) = (0.0, 10.0);
}

/// Externally tunable sky parameters, read once per tick by [`DynamicSky`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParams {
    /// Atmospheric haze
    pub turbidity: f32,
    /// Rayleigh scattering scale
    pub rayleigh: f32,
    /// Mie scattering coefficient
    pub mie_coefficient: f32,
    /// Mie anisotropy
    pub mie_directional_g: f32,
    /// Tone-mapping exposure written to the renderer
    pub exposure: f32,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 0.425,
            mie_coefficient: 0.012,
            mie_directional_g: 1.0,
            exposure: 2.3,
        }
    }
}

impl SkyParams {
    /// Copy with every field clamped to its range
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let clamp = |value: f32, (min, max): (f32, f32)| utils::clamp(value, min, max);
        Self {
            turbidity: clamp(self.turbidity, ranges::TURBIDITY),
            rayleigh: clamp(self.rayleigh, ranges::RAYLEIGH),
            mie_coefficient: clamp(self.mie_coefficient, ranges::MIE_COEFFICIENT),
            mie_directional_g: clamp(self.mie_directional_g, ranges::MIE_DIRECTIONAL_G),
            exposure: clamp(self.exposure, ranges::EXPOSURE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps_every_field() {
        let wild = SkyParams {
            turbidity: 99.0,
            rayleigh: -1.0,
            mie_coefficient: f32::NAN,
            mie_directional_g: 3.0,
            exposure: 11.0,
        };
        let safe = wild.sanitized();

        assert_eq!(safe.turbidity, 20.0);
        assert_eq!(safe.rayleigh, 0.0);
        assert_eq!(safe.mie_coefficient, 0.0);
        assert_eq!(safe.mie_directional_g, 1.0);
        assert_eq!(safe.exposure, 10.0);
        assert_eq!(SkyParams::default().sanitized(), SkyParams::default());
    }
}
