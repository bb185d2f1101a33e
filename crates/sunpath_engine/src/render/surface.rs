//! Presentation surface abstraction
//!
//! The host environment owns the drawable. The engine only needs its client
//! size, its pixel ratio, a way to resize the backing store and a way to learn
//! that the client size changed.

use super::targets::Extent;

/// A drawable surface provided by the host
pub trait Surface {
    /// Client size in logical pixels
    fn client_size(&self) -> (u32, u32);

    /// Ratio between physical and logical pixels
    fn pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Resize the backing store to `extent` physical pixels
    fn set_size(&mut self, extent: Extent);

    /// Consume a pending size-change notification
    fn take_resize_event(&mut self) -> bool;
}

/// In-memory surface for headless runs and tests
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    client: (u32, u32),
    pixel_ratio: f32,
    backing: Extent,
    pending_resize: bool,
    resize_calls: u32,
}

impl HeadlessSurface {
    /// Create a surface with a logical client size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            client: (width, height),
            pixel_ratio: 1.0,
            backing: Extent::new(0, 0),
            pending_resize: false,
            resize_calls: 0,
        }
    }

    /// Builder-style pixel ratio override
    #[must_use]
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
        self
    }

    /// Simulate the host resizing the surface
    pub fn simulate_resize(&mut self, width: u32, height: u32) {
        self.client = (width, height);
        self.pending_resize = true;
    }

    /// Size of the backing store
    pub fn backing_size(&self) -> Extent {
        self.backing
    }

    /// How many times `set_size` was called
    pub fn resize_calls(&self) -> u32 {
        self.resize_calls
    }
}

impl Surface for HeadlessSurface {
    fn client_size(&self) -> (u32, u32) {
        self.client
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn set_size(&mut self, extent: Extent) {
        self.backing = extent;
        self.resize_calls += 1;
    }

    fn take_resize_event(&mut self) -> bool {
        std::mem::take(&mut self.pending_resize)
    }
}
