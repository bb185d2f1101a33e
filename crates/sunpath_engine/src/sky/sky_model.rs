//! Preetham-style analytic daylight model
//!
//! Evaluates the same scattering approximation the sky dome shader uses:
//! Rayleigh and Mie extinction along an optical path that depends on the view
//! zenith angle, in-scattering with Rayleigh and Henyey-Greenstein phase
//! functions, and a sun disc.

use crate::foundation::math::{utils, Vec3};

/// Scale of the sky dome; also normalizes the sun height in the fade term
pub const SKY_DOME_SCALE: f32 = 450_000.0;

const TOTAL_RAYLEIGH: [f32; 3] = [5.804_543e-6, 1.356_291_1e-5, 3.026_590_2e-5];
const MIE_CONST: [f32; 3] = [1.839_991_8e14, 2.779_802_4e14, 4.079_048e14];
const CUTOFF_ANGLE: f32 = 1.611_073_2;
const STEEPNESS: f32 = 1.5;
const EE: f32 = 1000.0;
const RAYLEIGH_ZENITH_LENGTH: f32 = 8.4e3;
const MIE_ZENITH_LENGTH: f32 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.999_956_7;
const THREE_OVER_SIXTEEN_PI: f32 = 0.059_683_103;
const ONE_OVER_FOUR_PI: f32 = 0.079_577_47;

/// Uniform block of the sky dome
#[derive(Debug, Clone, PartialEq)]
pub struct SkyUniforms {
    /// Atmospheric haze
    pub turbidity: f32,
    /// Rayleigh scattering scale
    pub rayleigh: f32,
    /// Mie scattering coefficient
    pub mie_coefficient: f32,
    /// Mie anisotropy
    pub mie_directional_g: f32,
    /// World position of the sun (only its direction and height matter)
    pub sun_position: Vec3,
    /// Zenith direction
    pub up: Vec3,
}

impl Default for SkyUniforms {
    fn default() -> Self {
        Self {
            turbidity: 2.0,
            rayleigh: 1.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            sun_position: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl SkyUniforms {
    /// Radiance seen along the unit world direction `direction`
    pub fn radiance(&self, direction: &Vec3) -> Vec3 {
        let up = self.up.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
        let sun_direction = self.sun_position.try_normalize(f32::EPSILON).unwrap_or(up);

        // Per-dome terms
        let sun_e = sun_intensity(sun_direction.dot(&up));
        let sun_fade = 1.0 - utils::clamp(1.0 - (self.sun_position.y / SKY_DOME_SCALE).exp(), 0.0, 1.0);
        let rayleigh_coefficient = self.rayleigh - (1.0 - sun_fade);
        let beta_r = Vec3::from(TOTAL_RAYLEIGH) * rayleigh_coefficient;
        let beta_m = total_mie(self.turbidity) * self.mie_coefficient;

        // Optical length
        let zenith_angle = up.dot(direction).max(0.0).acos();
        let inverse = 1.0 / (zenith_angle.cos() + 0.15 * (93.885 - zenith_angle.to_degrees()).powf(-1.253));
        let s_r = RAYLEIGH_ZENITH_LENGTH * inverse;
        let s_m = MIE_ZENITH_LENGTH * inverse;
        let fex = (-(beta_r * s_r + beta_m * s_m)).map(f32::exp);

        // In-scattering
        let cos_theta = direction.dot(&sun_direction);
        let beta_r_theta = beta_r * rayleigh_phase(cos_theta * 0.5 + 0.5);
        let beta_m_theta = beta_m * hg_phase(cos_theta, self.mie_directional_g);
        let ratio = (beta_r_theta + beta_m_theta).component_div(&(beta_r + beta_m).map(guard));

        let mut lin = (ratio * sun_e).component_mul(&(Vec3::repeat(1.0) - fex)).map(|c| c.max(0.0).powf(1.5));
        let horizon_mix = utils::clamp((1.0 - up.dot(&sun_direction)).powi(5), 0.0, 1.0);
        let twilight = (ratio * sun_e).component_mul(&fex).map(|c| c.max(0.0).sqrt());
        lin = lin.component_mul(&Vec3::repeat(1.0).lerp(&twilight, horizon_mix));

        // Sun disc
        let mut l0 = fex * 0.1;
        let sun_disk = utils::smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.000_02, cos_theta);
        l0 += fex * (sun_e * 19_000.0 * sun_disk);

        let tex_color = (lin + l0) * 0.04 + Vec3::new(0.0, 0.000_3, 0.000_75);
        let exponent = 1.0 / (1.2 + 1.2 * sun_fade);
        tex_color.map(|c| c.max(0.0).powf(exponent))
    }
}

fn sun_intensity(zenith_angle_cos: f32) -> f32 {
    let cos = zenith_angle_cos.clamp(-1.0, 1.0);
    EE * (1.0 - (-((CUTOFF_ANGLE - cos.acos()) / STEEPNESS)).exp()).max(0.0)
}

fn total_mie(turbidity: f32) -> Vec3 {
    let c = 0.2 * turbidity * 10e-18;
    Vec3::from(MIE_CONST) * (0.434 * c)
}

fn rayleigh_phase(cos_theta: f32) -> f32 {
    THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta)
}

/// Henyey-Greenstein phase; the singular `g = 1` lobe evaluates to zero
fn hg_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let numerator = 1.0 - g2;
    if numerator <= 0.0 {
        return 0.0;
    }
    let denominator = (1.0 - 2.0 * g * cos_theta + g2).max(f32::EPSILON).powf(1.5);
    ONE_OVER_FOUR_PI * numerator / denominator
}

fn guard(c: f32) -> f32 {
    if c.abs() < 1e-12 {
        1e-12_f32.copysign(c)
    } else {
        c
    }
}
