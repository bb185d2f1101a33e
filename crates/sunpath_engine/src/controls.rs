//! Control panel
//!
//! The externally mutable parameter surface. A GUI, a config file or a test
//! writes these fields; animatables and the pipeline poll them once per
//! frame. Nothing here holds a reference into the renderer or the scene.
//!
//! Setters clamp to the ranges the parameter groups publish, logging a
//! warning when a value had to be adjusted.

use serde::{Deserialize, Serialize};

use crate::foundation::math::utils;
use crate::render::passes::{denoise, ssgi, DenoiseParams, SsgiParams};
use crate::sky::{self, SkyParams};
use crate::sun::{self, SolarTime, SunPathParams};

/// Light intensity ranges
pub mod ranges {
    /// Sun (directional light) intensity
    pub const SUN_INTENSITY: (f32, f32) = (0.0, 10.0);
    /// Ambient light intensity
    pub const AMBIENT_INTENSITY: (f32, f32) = (0.0, 10.0);
}

/// Light levels applied by the sun path every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingParams {
    /// Directional light intensity
    pub sun_intensity: f32,
    /// Whether the sun casts shadows
    pub sun_shadows: bool,
    /// Ambient fill intensity
    pub ambient_intensity: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            sun_intensity: 3.0,
            sun_shadows: true,
            ambient_intensity: 0.4,
        }
    }
}

impl LightingParams {
    /// Copy with intensities clamped
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            sun_intensity: utils::clamp(self.sun_intensity, ranges::SUN_INTENSITY.0, ranges::SUN_INTENSITY.1),
            sun_shadows: self.sun_shadows,
            ambient_intensity: utils::clamp(
                self.ambient_intensity,
                ranges::AMBIENT_INTENSITY.0,
                ranges::AMBIENT_INTENSITY.1,
            ),
        }
    }
}

/// All tunable parameters of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPanel {
    /// Sky model
    pub sky: SkyParams,
    /// Screen-space GI
    pub ssgi: SsgiParams,
    /// GI denoiser
    pub denoise: DenoiseParams,
    /// Location and time of day
    pub sun: SunPathParams,
    /// Light levels
    pub lighting: LightingParams,
}

fn clamped(name: &str, value: f32, (min, max): (f32, f32)) -> f32 {
    let result = utils::clamp(value, min, max);
    if result != value {
        log::warn!("{name} {value} clamped to {result}");
    }
    result
}

fn clamped_u32(name: &str, value: u32, (min, max): (u32, u32)) -> u32 {
    let result = value.clamp(min, max);
    if result != value {
        log::warn!("{name} {value} clamped to {result}");
    }
    result
}

impl ControlPanel {
    /// Turn SSGI on or off
    ///
    /// Off zeroes the effective radius; on restores the configured one.
    pub fn set_ssgi_enabled(&mut self, enabled: bool) {
        self.ssgi.enabled = enabled;
        log::info!("SSGI {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Effective SSGI radius as the pipeline will see it
    pub fn effective_ssgi_radius(&self) -> f32 {
        self.ssgi.sanitized().radius
    }

    /// Set the SSGI world-space radius
    pub fn set_ssgi_radius(&mut self, radius: f32) {
        self.ssgi.radius = clamped("SSGI radius", radius, ssgi::ranges::RADIUS);
    }

    /// Set the number of angular slices
    pub fn set_ssgi_slice_count(&mut self, slices: u32) {
        self.ssgi.slice_count = clamped_u32("SSGI slice count", slices, ssgi::ranges::SLICE_COUNT);
    }

    /// Set the number of steps per slice side
    pub fn set_ssgi_step_count(&mut self, steps: u32) {
        self.ssgi.step_count = clamped_u32("SSGI step count", steps, ssgi::ranges::STEP_COUNT);
    }

    /// Set the AO intensity
    pub fn set_ssgi_ao_intensity(&mut self, intensity: f32) {
        self.ssgi.ao_intensity = clamped("AO intensity", intensity, ssgi::ranges::AO_INTENSITY);
    }

    /// Set the GI intensity
    pub fn set_ssgi_gi_intensity(&mut self, intensity: f32) {
        self.ssgi.gi_intensity = clamped("GI intensity", intensity, ssgi::ranges::GI_INTENSITY);
    }

    /// Set the thickness heuristic
    pub fn set_ssgi_thickness(&mut self, thickness: f32) {
        self.ssgi.thickness = clamped("SSGI thickness", thickness, ssgi::ranges::THICKNESS);
    }

    /// Switch between screen-space and world-space-aware sampling
    pub fn set_ssgi_screen_space_sampling(&mut self, enabled: bool) {
        self.ssgi.use_screen_space_sampling = enabled;
    }

    /// Replace the denoise parameters
    pub fn set_denoise(&mut self, params: DenoiseParams) {
        let safe = params.sanitized();
        if safe != params {
            log::warn!("Denoise parameters clamped to {safe:?}");
        }
        self.denoise = safe;
    }

    /// Set the denoise radius
    pub fn set_denoise_radius(&mut self, radius: u32) {
        self.denoise.radius = clamped_u32("Denoise radius", radius, denoise::ranges::RADIUS);
    }

    /// Replace the sky parameters
    pub fn set_sky(&mut self, params: SkyParams) {
        self.sky = SkyParams {
            turbidity: clamped("Turbidity", params.turbidity, sky::ranges::TURBIDITY),
            rayleigh: clamped("Rayleigh", params.rayleigh, sky::ranges::RAYLEIGH),
            mie_coefficient: clamped("Mie coefficient", params.mie_coefficient, sky::ranges::MIE_COEFFICIENT),
            mie_directional_g: clamped("Mie directional g", params.mie_directional_g, sky::ranges::MIE_DIRECTIONAL_G),
            exposure: clamped("Exposure", params.exposure, sky::ranges::EXPOSURE),
        };
    }

    /// Set how many simulated seconds pass per real second
    pub fn set_time_speed(&mut self, speed: f32) {
        self.sun.time_speed = clamped("Time speed", speed, sun::ranges::TIME_SPEED);
    }

    /// Pause or resume the simulated clock
    pub fn set_animate_time(&mut self, animate: bool) {
        self.sun.animate_time = animate;
    }

    /// Jump to a local calendar time
    pub fn set_time(&mut self, year: i32, month: u32, day: u32, hour: u32, minute: u32) {
        self.sun.time = SolarTime::new(year, month, day, hour, minute);
    }

    /// Move the observer
    pub fn set_location(&mut self, latitude: f64, longitude: f64) {
        self.sun.latitude = latitude.clamp(sun::ranges::LATITUDE.0, sun::ranges::LATITUDE.1);
        self.sun.longitude = longitude.clamp(sun::ranges::LONGITUDE.0, sun::ranges::LONGITUDE.1);
    }

    /// Rotate geographic north
    pub fn set_north_offset(&mut self, degrees: f32) {
        self.sun.north_offset = if degrees.is_finite() { degrees.rem_euclid(360.0) } else { 0.0 };
    }

    /// Set the sun intensity
    pub fn set_sun_intensity(&mut self, intensity: f32) {
        self.lighting.sun_intensity = clamped("Sun intensity", intensity, ranges::SUN_INTENSITY);
    }

    /// Toggle sun shadows
    pub fn set_sun_shadows(&mut self, enabled: bool) {
        self.lighting.sun_shadows = enabled;
    }

    /// Set the ambient intensity
    pub fn set_ambient_intensity(&mut self, intensity: f32) {
        self.lighting.ambient_intensity = clamped("Ambient intensity", intensity, ranges::AMBIENT_INTENSITY);
    }
}
