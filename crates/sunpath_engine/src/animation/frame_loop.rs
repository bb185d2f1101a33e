//! Frame loop state machine
//!
//! `Stopped -> Running` on [`FrameLoop::start`], `Running -> Stopped` on
//! [`FrameLoop::stop`]. While running, every host frame feeds the timer,
//! ticks the registry in order and renders. Errors from a tick or from
//! `render()` are returned to the caller unchanged; there is no per-frame
//! recovery or retry.

use thiserror::Error;

use crate::controls::ControlPanel;
use crate::foundation::time::FrameTimer;
use crate::render::{ActiveCameraController, FrameInputs, RenderError, RenderPipeline, RenderSettings};
use crate::scene::Scene;

use super::{Animatable, AnimatableId, AnimatableRegistry, AnimationHost, CallbackId, TickContext, TickError};

/// Errors escaping one frame callback
#[derive(Error, Debug)]
pub enum FrameError {
    /// An animatable failed
    #[error("Animatable '{name}' failed: {source}")]
    Tick {
        /// Name of the failing animatable
        name: String,
        /// Underlying error
        #[source]
        source: TickError,
    },

    /// The pipeline failed to render the frame
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No callback registered with the host
    Stopped,
    /// Callback registered; frames are processed
    Running,
}

/// Everything one frame mutates or reads
pub struct FrameWorld<'a> {
    /// Scene graph
    pub scene: &'a mut Scene,
    /// Cameras and the active handle
    pub cameras: &'a mut ActiveCameraController,
    /// Renderer-global settings
    pub settings: &'a mut RenderSettings,
    /// Parameter surface
    pub controls: &'a mut ControlPanel,
    /// Pipeline; frames only simulate when absent
    pub pipeline: Option<&'a mut RenderPipeline>,
}

/// Summary of one processed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    /// Index of the frame
    pub frame_index: u64,
    /// Delta handed to every animatable, in seconds
    pub delta: f32,
    /// Whether the pipeline rendered
    pub rendered: bool,
}

/// The orchestrator: timer, registry and render submission
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    callback: Option<CallbackId>,
    timer: FrameTimer,
    registry: AnimatableRegistry,
    frames: u64,
}

impl FrameLoop {
    /// Create a stopped loop whose deltas are clamped to `max_delta` seconds
    pub fn new(max_delta: f32) -> Self {
        Self {
            state: LoopState::Stopped,
            callback: None,
            timer: FrameTimer::with_max_delta(max_delta),
            registry: AnimatableRegistry::new(),
            frames: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames processed since creation
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Register with the host; a no-op while already running
    pub fn start(&mut self, host: &mut dyn AnimationHost) {
        if self.state == LoopState::Running {
            log::debug!("Frame loop already running; start ignored");
            return;
        }

        self.callback = Some(host.register_frame_callback());
        self.state = LoopState::Running;
        log::info!("Frame loop started with {} animatables", self.registry.len());
    }

    /// Deregister from the host; a no-op while stopped
    pub fn stop(&mut self, host: &mut dyn AnimationHost) {
        if let Some(callback) = self.callback.take() {
            host.unregister_frame_callback(callback);
        }
        if self.state == LoopState::Running {
            self.state = LoopState::Stopped;
            log::info!("Frame loop stopped after {} frames", self.frames);
        }
    }

    /// Append an animatable to the tick order
    pub fn register(&mut self, animatable: Box<dyn Animatable>) -> AnimatableId {
        self.registry.register(animatable)
    }

    /// Remove an animatable from the tick order
    pub fn remove(&mut self, id: AnimatableId) -> Option<Box<dyn Animatable>> {
        self.registry.remove(id)
    }

    /// Registered animatables
    pub fn registry(&self) -> &AnimatableRegistry {
        &self.registry
    }

    /// Process one host frame
    ///
    /// Returns `Ok(None)` when the loop is stopped: a stop issued between two
    /// frames takes effect before the next one.
    pub fn on_frame(&mut self, timestamp_ms: f64, world: FrameWorld<'_>) -> Result<Option<FrameOutcome>, FrameError> {
        if self.state != LoopState::Running {
            return Ok(None);
        }

        self.timer.update(timestamp_ms);
        let delta = self.timer.get_delta();
        let frame_index = self.frames;

        let FrameWorld {
            scene,
            cameras,
            settings,
            controls,
            pipeline,
        } = world;

        let mut ctx = TickContext {
            scene: &mut *scene,
            cameras: &mut *cameras,
            settings: &mut *settings,
            controls: &mut *controls,
            frame_index,
        };
        self.registry.tick_all(delta, &mut ctx)?;

        let rendered = match pipeline {
            Some(pipeline) => {
                let inputs = FrameInputs {
                    scene,
                    cameras: cameras.store(),
                    settings,
                    controls,
                };
                pipeline.render(&inputs)?;
                true
            }
            None => false,
        };

        self.frames += 1;
        log::trace!("Frame {} done (delta {:.4}s)", frame_index, delta);

        Ok(Some(FrameOutcome {
            frame_index,
            delta,
            rendered,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::HeadlessHost;
    use crate::render::CameraStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counter {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
        fail_at: Option<usize>,
    }

    impl Animatable for Counter {
        fn name(&self) -> &str {
            self.name
        }

        fn tick(&mut self, _delta: f32, _ctx: &mut TickContext<'_>) -> Result<(), TickError> {
            let mut log = self.log.borrow_mut();
            if self.fail_at == Some(log.len()) {
                return Err(TickError::Custom("boom".to_string()));
            }
            log.push(self.name);
            Ok(())
        }
    }

    struct World {
        scene: Scene,
        cameras: ActiveCameraController,
        settings: RenderSettings,
        controls: ControlPanel,
    }

    impl World {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                cameras: ActiveCameraController::new(CameraStore::new()),
                settings: RenderSettings::new(),
                controls: ControlPanel::default(),
            }
        }

        fn frame(&mut self) -> FrameWorld<'_> {
            FrameWorld {
                scene: &mut self.scene,
                cameras: &mut self.cameras,
                settings: &mut self.settings,
                controls: &mut self.controls,
                pipeline: None,
            }
        }
    }

    fn counter(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Box<Counter> {
        Box::new(Counter {
            name,
            log: Rc::clone(log),
            fail_at: None,
        })
    }

    #[test]
    fn test_ticks_every_animatable_once_per_frame_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = FrameLoop::new(1.0);
        frame_loop.register(counter("sun", &log));
        frame_loop.register(counter("sky", &log));

        let mut host = HeadlessHost::new(16.0).with_frame_limit(5);
        let mut world = World::new();
        frame_loop.start(&mut host);
        while let Some(ts) = host.next_frame() {
            frame_loop.on_frame(ts, world.frame()).unwrap();
        }

        let log = log.borrow();
        assert_eq!(log.len(), 10);
        assert_eq!(log.iter().filter(|n| **n == "sun").count(), 5);
        assert!(log.chunks(2).all(|pair| pair == ["sun", "sky"]));
        assert_eq!(frame_loop.frame_count(), 5);
    }

    #[test]
    fn test_zero_frames_means_zero_ticks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = FrameLoop::new(1.0);
        frame_loop.register(counter("only", &log));

        let mut host = HeadlessHost::new(16.0).with_frame_limit(0);
        frame_loop.start(&mut host);
        assert_eq!(host.next_frame(), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_start_twice_registers_once() {
        let mut frame_loop = FrameLoop::new(1.0);
        let mut host = HeadlessHost::new(16.0);

        frame_loop.start(&mut host);
        frame_loop.start(&mut host);
        assert_eq!(host.registered_callbacks(), 1);
        assert_eq!(frame_loop.state(), LoopState::Running);

        frame_loop.stop(&mut host);
        frame_loop.stop(&mut host);
        assert_eq!(host.registered_callbacks(), 0);
        assert_eq!(frame_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn test_stopped_loop_ignores_frames() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = FrameLoop::new(1.0);
        frame_loop.register(counter("a", &log));
        let mut world = World::new();

        assert!(frame_loop.on_frame(16.0, world.frame()).unwrap().is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_tick_error_propagates_and_skips_rest_of_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = FrameLoop::new(1.0);
        frame_loop.register(Box::new(Counter {
            name: "broken",
            log: Rc::clone(&log),
            fail_at: Some(0),
        }));
        frame_loop.register(counter("after", &log));

        let mut host = HeadlessHost::new(16.0);
        let mut world = World::new();
        frame_loop.start(&mut host);

        let err = frame_loop.on_frame(16.0, world.frame()).unwrap_err();
        assert!(matches!(err, FrameError::Tick { ref name, .. } if name == "broken"));
        assert!(log.borrow().is_empty());
        assert_eq!(frame_loop.frame_count(), 0);
    }

    #[test]
    fn test_removed_animatable_stops_ticking() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = FrameLoop::new(1.0);
        let bird = frame_loop.register(counter("bird", &log));
        frame_loop.register(counter("sky", &log));

        let mut host = HeadlessHost::new(16.0);
        let mut world = World::new();
        frame_loop.start(&mut host);
        frame_loop.on_frame(16.0, world.frame()).unwrap();
        assert!(frame_loop.remove(bird).is_some());
        frame_loop.on_frame(32.0, world.frame()).unwrap();

        assert_eq!(*log.borrow(), vec!["bird", "sky", "sky"]);
        assert_eq!(frame_loop.registry().names(), vec!["sky"]);
    }

    #[test]
    fn test_stall_delta_is_clamped() {
        let mut frame_loop = FrameLoop::new(1.0);
        let mut host = HeadlessHost::new(16.0);
        let mut world = World::new();
        frame_loop.start(&mut host);

        let first = host.next_frame().unwrap();
        frame_loop.on_frame(first, world.frame()).unwrap();
        host.stall(60_000.0);
        let second = host.next_frame().unwrap();
        let outcome = frame_loop.on_frame(second, world.frame()).unwrap().unwrap();

        assert!(outcome.delta >= 0.0 && outcome.delta <= 1.0);
        assert!(!outcome.rendered);
    }
}
