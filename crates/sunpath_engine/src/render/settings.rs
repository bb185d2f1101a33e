//! Renderer-global settings shared between the pipeline and animatables
//!
//! Tone-mapping exposure is process-wide state. It has exactly one writer for
//! the session: whoever holds the [`ExposureClaim`] of a settings object.
//! Everyone else may read it.

use super::{RenderError, RenderResult};

/// Default tone-mapping exposure before any owner writes it
pub const DEFAULT_EXPOSURE: f32 = 1.0;

/// Proof of write ownership over [`RenderSettings::tone_mapping_exposure`]
///
/// Only one claim is ever handed out per settings object. The token is not
/// `Clone`, so ownership moves with it.
#[derive(Debug, PartialEq, Eq)]
pub struct ExposureClaim {
    settings_id: u64,
}

/// Renderer-global settings
#[derive(Debug)]
pub struct RenderSettings {
    id: u64,
    tone_mapping_exposure: f32,
    claimed: bool,

    /// Whether lights cast shadows in the scene capture pass
    pub shadows: bool,
}

impl RenderSettings {
    /// Create settings with default exposure and shadows enabled
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            tone_mapping_exposure: DEFAULT_EXPOSURE,
            claimed: false,
            shadows: true,
        }
    }

    /// Current tone-mapping exposure
    pub fn tone_mapping_exposure(&self) -> f32 {
        self.tone_mapping_exposure
    }

    /// Take the single write claim on exposure
    ///
    /// # Errors
    /// [`RenderError::SettingsOwnership`] when the claim is already held.
    pub fn claim_exposure(&mut self) -> RenderResult<ExposureClaim> {
        if self.claimed {
            return Err(RenderError::SettingsOwnership(
                "tone-mapping exposure already has an owner".to_string(),
            ));
        }

        self.claimed = true;
        log::debug!("Tone-mapping exposure claimed");
        Ok(ExposureClaim { settings_id: self.id })
    }

    /// Give the claim back so another owner can take it
    pub fn release_exposure(&mut self, claim: ExposureClaim) -> RenderResult<()> {
        self.check(&claim)?;
        self.claimed = false;
        Ok(())
    }

    /// Whether someone currently owns exposure
    pub fn is_exposure_claimed(&self) -> bool {
        self.claimed
    }

    /// Write exposure through a claim
    ///
    /// Non-finite or negative values are clamped to zero.
    pub fn set_tone_mapping_exposure(&mut self, claim: &ExposureClaim, exposure: f32) -> RenderResult<()> {
        self.check(claim)?;
        self.tone_mapping_exposure = if exposure.is_finite() { exposure.max(0.0) } else { 0.0 };
        Ok(())
    }

    fn check(&self, claim: &ExposureClaim) -> RenderResult<()> {
        if claim.settings_id == self.id && self.claimed {
            Ok(())
        } else {
            Err(RenderError::SettingsOwnership(
                "claim belongs to a different settings object".to_string(),
            ))
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::new()
    }
}
