//! # Application Configuration
//!
//! Everything needed to bootstrap a session, in one serializable structure:
//!
//! - **Engine Config**: logging, frame-delta clamp, headless frame interval
//! - **Pipeline Config**: quality preset and initial surface size
//! - **Parameter groups**: sky, SSGI, denoise, sun path and lighting defaults,
//!   which seed the [`ControlPanel`]
//!
//! Missing fields fall back to defaults, so a config file only needs the
//! values it changes.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::controls::{ControlPanel, LightingParams};
use crate::render::passes::{DenoiseParams, SsgiParams};
use crate::render::{Extent, Quality};
use crate::sky::SkyParams;
use crate::sun::SunPathParams;

/// # Engine Configuration
///
/// Core engine behaviour shared by every application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Largest simulation step in seconds
    pub max_frame_delta: f32,
    /// Frame interval of the headless host in milliseconds
    pub frame_interval_ms: f64,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_frame_delta: 1.0,
            frame_interval_ms: 1000.0 / 60.0,
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the frame-delta clamp
    #[must_use]
    pub fn with_max_frame_delta(mut self, seconds: f32) -> Self {
        self.max_frame_delta = seconds;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Pipeline Configuration
///
/// Initial presentation setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Quality preset
    pub quality: Quality,
    /// Initial client width in logical pixels
    pub width: u32,
    /// Initial client height in logical pixels
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
}

impl PipelineConfig {
    /// Create a desktop configuration at 800x600
    pub fn new() -> Self {
        Self {
            quality: Quality::Desktop,
            width: 800,
            height: 600,
            pixel_ratio: 1.0,
        }
    }

    /// Set the initial size
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the quality preset
    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Initial physical extent
    pub fn extent(&self) -> Extent {
        Extent::new(
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Pipeline configuration
    pub pipeline: PipelineConfig,
    /// Sky defaults
    pub sky: SkyParams,
    /// SSGI defaults
    pub ssgi: SsgiParams,
    /// Denoise defaults
    pub denoise: DenoiseParams,
    /// Sun path defaults
    pub sun: SunPathParams,
    /// Light level defaults
    pub lighting: LightingParams,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    ///
    /// Tunable parameters are only clamped at use, so this checks what cannot
    /// be clamped meaningfully: sizes, the frame clock and the log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.width == 0 || self.pipeline.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size {}x{} has a zero dimension",
                self.pipeline.width, self.pipeline.height
            )));
        }
        if !(self.pipeline.pixel_ratio.is_finite() && self.pipeline.pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!("pixel ratio {} must be positive", self.pipeline.pixel_ratio)));
        }
        if !(self.engine.max_frame_delta.is_finite() && self.engine.max_frame_delta > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max frame delta {} must be positive",
                self.engine.max_frame_delta
            )));
        }
        if !(self.engine.frame_interval_ms.is_finite() && self.engine.frame_interval_ms > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame interval {} ms must be positive",
                self.engine.frame_interval_ms
            )));
        }
        if self.engine.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.engine.log_level)));
        }
        Ok(())
    }

    /// Seed a control panel from the parameter defaults
    pub fn control_panel(&self) -> ControlPanel {
        ControlPanel {
            sky: self.sky.clone(),
            ssgi: self.ssgi.clone(),
            denoise: self.denoise.clone(),
            sun: self.sun.clone(),
            lighting: self.lighting.clone(),
        }
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        ApplicationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ApplicationConfig::from_toml_str(
            r#"
            [pipeline]
            quality = "Mobile"
            width = 1920
            height = 1080

            [ssgi]
            gi_intensity = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.quality, Quality::Mobile);
        assert_eq!(config.pipeline.extent(), Extent::new(1920, 1080));
        assert_eq!(config.ssgi.gi_intensity, 0.0);
        assert_eq!(config.ssgi.radius, SsgiParams::default().radius);
        assert_eq!(config.sky, SkyParams::default());
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let config = ApplicationConfig {
            pipeline: PipelineConfig::new().with_size(0, 600),
            ..ApplicationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_log_level_is_invalid() {
        let config = ApplicationConfig {
            engine: EngineConfig::new().with_log_level("loud"),
            ..ApplicationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("sunpath_config_{}.ron", std::process::id()));
        let mut config = ApplicationConfig::default();
        config.sun.north_offset = 12.0;

        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
