//! Headless surface replaying window resizes at scripted frames

use sunpath_engine::render::{Extent, HeadlessSurface, Surface};

/// Surface whose client size changes at fixed frame numbers
///
/// The engine polls for resize events once per frame, which is what advances
/// the script.
#[derive(Debug, Clone)]
pub struct ScriptedSurface {
    inner: HeadlessSurface,
    script: Vec<(u64, u32, u32)>,
    polls: u64,
}

impl ScriptedSurface {
    /// Surface starting at `width` x `height` logical pixels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: HeadlessSurface::new(width, height),
            script: Vec::new(),
            polls: 0,
        }
    }

    /// Builder-style pixel ratio
    #[must_use]
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.inner = self.inner.with_pixel_ratio(ratio);
        self
    }

    /// Resize to `width` x `height` just before frame `frame` renders
    #[must_use]
    pub fn resize_at(mut self, frame: u64, width: u32, height: u32) -> Self {
        self.script.push((frame, width, height));
        self.script.sort_by_key(|(frame, _, _)| *frame);
        self
    }

    /// Size of the backing store
    pub fn backing_size(&self) -> Extent {
        self.inner.backing_size()
    }
}

impl Surface for ScriptedSurface {
    fn client_size(&self) -> (u32, u32) {
        self.inner.client_size()
    }

    fn pixel_ratio(&self) -> f32 {
        self.inner.pixel_ratio()
    }

    fn set_size(&mut self, extent: Extent) {
        self.inner.set_size(extent);
    }

    fn take_resize_event(&mut self) -> bool {
        let frame = self.polls;
        self.polls += 1;
        for (_, width, height) in self.script.iter().filter(|(at, _, _)| *at == frame) {
            log::info!("Window resized to {width}x{height} before frame {frame}");
            self.inner.simulate_resize(*width, *height);
        }
        self.inner.take_resize_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_fires_on_its_frame_only() {
        let mut surface = ScriptedSurface::new(320, 180).resize_at(2, 640, 360);

        assert!(!surface.take_resize_event());
        assert!(!surface.take_resize_event());
        assert!(surface.take_resize_event());
        assert_eq!(surface.client_size(), (640, 360));
        assert!(!surface.take_resize_event());
    }
}
