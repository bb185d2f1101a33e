//! Device capabilities
//!
//! The device and its context are created by the host process. The pipeline
//! only receives this description and refuses to build on hardware that cannot
//! run the pass graph.

use serde::{Deserialize, Serialize};

use super::{Extent, RenderError, RenderResult};

/// Minimum colour attachments the scene capture pass writes at once
pub const REQUIRED_COLOR_ATTACHMENTS: u32 = 3;

/// Kind of backend the host created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Modern native backend (compute-capable)
    Native,
    /// Reduced feature fallback backend
    Fallback,
    /// Deterministic CPU reference backend
    Reference,
}

impl BackendKind {
    /// Human readable indicator shown at startup
    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Native => "native GPU backend",
            Self::Fallback => "fallback backend (reduced features)",
            Self::Reference => "CPU reference backend",
        }
    }
}

/// Description of the device the pipeline runs on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Backend identifier
    pub backend: BackendKind,

    /// Adapter name reported by the host
    pub adapter_name: String,

    /// Maximum simultaneous colour attachments (MRT)
    pub max_color_attachments: u32,

    /// Whether float render targets are supported
    pub float_render_targets: bool,

    /// Maximum 2D texture dimension
    pub max_texture_dimension_2d: u32,
}

impl DeviceCapabilities {
    /// Capabilities of the built-in CPU reference backend
    pub fn reference() -> Self {
        Self {
            backend: BackendKind::Reference,
            adapter_name: "cpu-reference".to_string(),
            max_color_attachments: 8,
            float_render_targets: true,
            max_texture_dimension_2d: 8192,
        }
    }

    /// Check that the pass graph can run at `extent` on this device
    pub fn validate_for(&self, extent: Extent) -> RenderResult<()> {
        if self.max_color_attachments < REQUIRED_COLOR_ATTACHMENTS {
            return Err(RenderError::UnsupportedDevice(format!(
                "{} offers {} colour attachments, scene capture needs {}",
                self.adapter_name, self.max_color_attachments, REQUIRED_COLOR_ATTACHMENTS
            )));
        }

        if !self.float_render_targets {
            return Err(RenderError::UnsupportedDevice(format!(
                "{} cannot render to float targets",
                self.adapter_name
            )));
        }

        if !self.fits(extent) {
            return Err(RenderError::UnsupportedDevice(format!(
                "{extent} exceeds the maximum texture dimension {}",
                self.max_texture_dimension_2d
            )));
        }

        Ok(())
    }

    /// Whether `extent` fits inside the texture limits
    pub fn fits(&self, extent: Extent) -> bool {
        extent.width <= self.max_texture_dimension_2d && extent.height <= self.max_texture_dimension_2d
    }

    /// Log the active backend
    pub fn log_backend(&self) {
        match self.backend {
            BackendKind::Fallback => log::warn!("Rendering with {} on {}", self.backend.indicator(), self.adapter_name),
            _ => log::info!("Rendering with {} on {}", self.backend.indicator(), self.adapter_name),
        }
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_device_accepts_full_hd() {
        DeviceCapabilities::reference().validate_for(Extent::new(1920, 1080)).unwrap();
    }

    #[test]
    fn test_missing_mrt_is_rejected() {
        let caps = DeviceCapabilities {
            max_color_attachments: 1,
            ..DeviceCapabilities::reference()
        };
        assert!(matches!(
            caps.validate_for(Extent::new(8, 8)),
            Err(RenderError::UnsupportedDevice(_))
        ));
    }

    #[test]
    fn test_oversized_extent_is_rejected() {
        let caps = DeviceCapabilities {
            max_texture_dimension_2d: 1024,
            ..DeviceCapabilities::reference()
        };
        assert!(caps.validate_for(Extent::new(2048, 16)).is_err());
        assert!(!caps.fits(Extent::new(16, 2048)));
    }
}
