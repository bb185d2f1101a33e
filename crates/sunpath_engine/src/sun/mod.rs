//! Sun path
//!
//! Places the sun in the scene from a geographic location and a local time of
//! day, and optionally advances that time every frame.

pub mod ephemeris;
pub mod sun_path;

pub use ephemeris::{NoaaEphemeris, SolarEphemeris, SolarTime, SunPosition};
pub use sun_path::SunPath;

use serde::{Deserialize, Serialize};

use crate::foundation::math::utils;

/// Sun path parameter ranges exposed to control surfaces
pub mod ranges {
    /// Simulated seconds per real second
    pub const TIME_SPEED: (f32, f32) = (0.0, 10_000.0);
    /// Latitude in degrees
    pub const LATITUDE: (f64, f64) = (-90.0, 90.0);
    /// Longitude in degrees
    pub const LONGITUDE: (f64, f64) = (-180.0, 180.0);
    /// Offset of local time from UTC in hours
    pub const UTC_OFFSET: (f64, f64) = (-12.0, 14.0);
}

/// Location, time and layout of the sun path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunPathParams {
    /// Observer latitude in degrees, north positive
    pub latitude: f64,
    /// Observer longitude in degrees, east positive
    pub longitude: f64,
    /// Hours local time is ahead of UTC
    pub utc_offset: f64,
    /// Rotation of geographic north around +Y in degrees
    pub north_offset: f32,
    /// Distance of the sun from the path centre
    pub radius: f32,
    /// Height of the path centre
    pub base_y: f32,
    /// Advance time every frame
    pub animate_time: bool,
    /// Simulated seconds per real second
    pub time_speed: f32,
    /// Local calendar time
    pub time: SolarTime,
}

impl Default for SunPathParams {
    fn default() -> Self {
        Self {
            latitude: -23.029_396,
            longitude: -46.974_293,
            utc_offset: -3.0,
            north_offset: 303.0,
            radius: 18.0,
            base_y: 0.0,
            animate_time: true,
            time_speed: 100.0,
            time: SolarTime::new(2024, 12, 21, 9, 0),
        }
    }
}

impl SunPathParams {
    /// Copy with location and speed clamped to their ranges
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let clamp64 = |value: f64, (min, max): (f64, f64)| if value.is_nan() { min } else { value.clamp(min, max) };
        Self {
            latitude: clamp64(self.latitude, ranges::LATITUDE),
            longitude: clamp64(self.longitude, ranges::LONGITUDE),
            utc_offset: clamp64(self.utc_offset, ranges::UTC_OFFSET),
            north_offset: if self.north_offset.is_finite() { self.north_offset.rem_euclid(360.0) } else { 0.0 },
            radius: if self.radius.is_finite() { self.radius.max(0.0) } else { 0.0 },
            base_y: if self.base_y.is_finite() { self.base_y } else { 0.0 },
            animate_time: self.animate_time,
            time_speed: utils::clamp(self.time_speed, ranges::TIME_SPEED.0, ranges::TIME_SPEED.1),
            time: SolarTime {
                second: if self.time.second.is_finite() { self.time.second.clamp(0.0, 59.999) } else { 0.0 },
                ..SolarTime::new(self.time.year, self.time.month, self.time.day, self.time.hour, self.time.minute)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps_location_and_speed() {
        let params = SunPathParams {
            latitude: 123.0,
            longitude: f64::NAN,
            north_offset: -90.0,
            time_speed: 50_000.0,
            time: SolarTime::new(2024, 13, 40, 30, 70),
            ..SunPathParams::default()
        }
        .sanitized();

        assert_eq!(params.latitude, 90.0);
        assert_eq!(params.longitude, -180.0);
        assert_eq!(params.north_offset, 270.0);
        assert_eq!(params.time_speed, 10_000.0);
        assert_eq!((params.time.month, params.time.day, params.time.hour, params.time.minute), (12, 31, 23, 59));
    }
}
