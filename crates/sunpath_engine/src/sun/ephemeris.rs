//! Solar ephemeris
//!
//! Computes solar azimuth and elevation from geographic coordinates and a
//! local calendar time. [`NoaaEphemeris`] follows the NOAA solar calculator
//! (pure math, no tables).

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Apparent position of the sun in the local sky
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Degrees clockwise from north (90 = east)
    pub azimuth: f64,
    /// Degrees above the horizon, negative below
    pub elevation: f64,
}

impl SunPosition {
    /// Unit direction towards the sun, Y up, north along -Z
    pub fn to_direction(&self) -> Vec3 {
        let az = self.azimuth.to_radians();
        let el = self.elevation.to_radians();
        let cos_el = el.cos();
        Vec3::new((-az.sin() * cos_el) as f32, el.sin() as f32, (-az.cos() * cos_el) as f32)
    }
}

/// Local calendar time, to the second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarTime {
    /// Year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Day of month, 1-based
    pub day: u32,
    /// Hour, 0-23
    pub hour: u32,
    /// Minute, 0-59
    pub minute: u32,
    /// Seconds within the minute
    pub second: f64,
}

impl SolarTime {
    /// Build a time, clamping each field into its calendar range
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let month = month.clamp(1, 12);
        Self {
            year,
            month,
            day: day.clamp(1, days_in_month(year, month)),
            hour: hour.min(23),
            minute: minute.min(59),
            second: 0.0,
        }
    }

    /// Hours since local midnight, with fraction
    pub fn fractional_hour(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0 + self.second / 3600.0
    }

    /// Move forward by `seconds`, rolling over into minutes, days and years
    ///
    /// Negative or non-finite amounts are ignored.
    pub fn advance(&mut self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }

        let total = self.second + seconds;
        let whole_minutes = (total / 60.0).floor();
        self.second = total - whole_minutes * 60.0;

        let minutes = self.minute as u64 + whole_minutes as u64;
        self.minute = (minutes % 60) as u32;
        let hours = self.hour as u64 + minutes / 60;
        self.hour = (hours % 24) as u32;

        for _ in 0..hours / 24 {
            self.day += 1;
            if self.day > days_in_month(self.year, self.month) {
                self.day = 1;
                self.month += 1;
                if self.month > 12 {
                    self.month = 1;
                    self.year += 1;
                }
            }
        }
    }
}

/// Number of days in `month` of `year`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Source of sun positions
pub trait SolarEphemeris {
    /// Sun position seen from `latitude`/`longitude` (degrees, east positive)
    /// at local `time`, `utc_offset` hours ahead of UTC
    fn sun_position(&self, latitude: f64, longitude: f64, utc_offset: f64, time: &SolarTime) -> SunPosition;
}

/// NOAA solar calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoaaEphemeris;

impl SolarEphemeris for NoaaEphemeris {
    fn sun_position(&self, latitude: f64, longitude: f64, utc_offset: f64, time: &SolarTime) -> SunPosition {
        let lat = latitude.clamp(-90.0, 90.0);
        let lon = longitude.clamp(-180.0, 180.0);

        // May fall outside 0..24; the Julian day is linear in the hour
        let utc_hour = time.fractional_hour() - utc_offset;
        let t = julian_century(julian_day(time.year, time.month, time.day, utc_hour));

        let eqtime = eq_of_time(t);
        let decl = sun_declination(t);

        let true_solar_time = (utc_hour * 60.0 + eqtime + 4.0 * lon).rem_euclid(1440.0);
        let ha = true_solar_time / 4.0 - 180.0;
        let zenith = solar_zenith(lat, decl, ha);

        SunPosition {
            azimuth: solar_azimuth(lat, zenith, decl, ha),
            elevation: 90.0 - zenith,
        }
    }
}

fn julian_day(year: i32, month: u32, day: u32, hour: f64) -> f64 {
    let (y, m) = if month <= 2 { (year - 1, month + 12) } else { (year, month) };
    let a = (y as f64 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (y as f64 + 4716.0)).floor() + (30.6001 * (m as f64 + 1.0)).floor() + day as f64 + hour / 24.0 + b
        - 1524.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

fn geom_mean_long_sun(t: f64) -> f64 {
    (280.466_46 + t * (36_000.769_83 + 0.000_303_2 * t)).rem_euclid(360.0)
}

fn geom_mean_anomaly_sun(t: f64) -> f64 {
    357.529_11 + t * (35_999.050_29 - 0.000_153_7 * t)
}

fn eccent_earth_orbit(t: f64) -> f64 {
    0.016_708_634 - t * (0.000_042_037 + 0.000_000_126_7 * t)
}

fn sun_eq_of_center(t: f64) -> f64 {
    let m = geom_mean_anomaly_sun(t).to_radians();
    m.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m).sin() * 0.000_289
}

fn sun_apparent_long(t: f64) -> f64 {
    let true_long = geom_mean_long_sun(t) + sun_eq_of_center(t);
    true_long - 0.005_69 - 0.004_78 * (125.04 - 1934.136 * t).to_radians().sin()
}

fn obliq_corr(t: f64) -> f64 {
    let mean = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813))) / 60.0) / 60.0;
    mean + 0.002_56 * (125.04 - 1934.136 * t).to_radians().cos()
}

fn sun_declination(t: f64) -> f64 {
    let e = obliq_corr(t).to_radians();
    let lambda = sun_apparent_long(t).to_radians();
    (e.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time in minutes
fn eq_of_time(t: f64) -> f64 {
    let e = obliq_corr(t).to_radians();
    let l0 = geom_mean_long_sun(t).to_radians();
    let ecc = eccent_earth_orbit(t);
    let m = geom_mean_anomaly_sun(t).to_radians();
    let y = (e / 2.0).tan().powi(2);

    let etime = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin() + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    etime.to_degrees() * 4.0
}

fn solar_zenith(lat: f64, decl: f64, ha: f64) -> f64 {
    let (lat, decl, ha) = (lat.to_radians(), decl.to_radians(), ha.to_radians());
    let cos_zenith = lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha.cos();
    cos_zenith.clamp(-1.0, 1.0).acos().to_degrees()
}

fn solar_azimuth(lat: f64, zenith: f64, decl: f64, ha: f64) -> f64 {
    let (lat, zenith, decl) = (lat.to_radians(), zenith.to_radians(), decl.to_radians());
    let num = lat.sin() * zenith.cos() - decl.sin();
    let den = lat.cos() * zenith.sin();

    let cos_az = if den.abs() < 1e-10 {
        if num >= 0.0 { 1.0 } else { -1.0 }
    } else {
        (num / den).clamp(-1.0, 1.0)
    };
    let az = cos_az.acos().to_degrees();

    if ha > 0.0 { (az + 180.0) % 360.0 } else { (540.0 - az) % 360.0 }
}
