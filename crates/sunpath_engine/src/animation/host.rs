//! Presentation driver abstraction
//!
//! The host owns frame pacing. The loop registers interest in per-frame
//! callbacks, and the host hands out frame timestamps while a callback is
//! registered.

/// Identity of a registered per-frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// Per-frame callback registration primitive of the host environment
pub trait AnimationHost {
    /// Register a per-frame callback
    fn register_frame_callback(&mut self) -> CallbackId;

    /// Deregister a callback; unknown ids are ignored
    fn unregister_frame_callback(&mut self, id: CallbackId);

    /// Number of live registrations
    fn registered_callbacks(&self) -> usize;

    /// Timestamp in milliseconds of the next frame, `None` while nothing is
    /// registered or the host has finished
    fn next_frame(&mut self) -> Option<f64>;
}

/// Fixed-interval host for headless runs and tests
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    interval_ms: f64,
    now_ms: f64,
    frames_remaining: Option<u64>,
    callbacks: Vec<CallbackId>,
    next_id: u64,
}

impl HeadlessHost {
    /// Host producing a frame every `interval_ms`
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: if interval_ms.is_finite() && interval_ms > 0.0 { interval_ms } else { 1000.0 / 60.0 },
            now_ms: 0.0,
            frames_remaining: None,
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// Builder-style limit on the number of frames produced
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frames_remaining = Some(frames);
        self
    }

    /// Current host clock in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Jump the clock forward, as when the page is backgrounded
    pub fn stall(&mut self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.now_ms += ms;
        }
    }
}

impl AnimationHost for HeadlessHost {
    fn register_frame_callback(&mut self) -> CallbackId {
        self.next_id += 1;
        let id = CallbackId(self.next_id);
        self.callbacks.push(id);
        id
    }

    fn unregister_frame_callback(&mut self, id: CallbackId) {
        self.callbacks.retain(|registered| *registered != id);
    }

    fn registered_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    fn next_frame(&mut self) -> Option<f64> {
        if self.callbacks.is_empty() {
            return None;
        }
        if let Some(remaining) = self.frames_remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        self.now_ms += self.interval_ms;
        Some(self.now_ms)
    }
}
