//! Core engine implementation
//!
//! The engine owns every piece of session state: the scene, the cameras, the
//! renderer settings, the control panel, the pipeline, the resizer and the
//! frame loop. Applications build on it through [`Application`].

use thiserror::Error;

use crate::animation::{Animatable, AnimatableId, AnimationHost, FrameError, FrameLoop, FrameOutcome, FrameWorld};
use crate::application::Application;
use crate::config::ConfigError;
use crate::controls::ControlPanel;
use crate::core::config::ApplicationConfig;
use crate::render::{
    ActiveCameraController, CameraBinding, CameraHandle, CameraStore, DeviceCapabilities, Extent, FrameBuffer,
    RenderError, RenderPipeline, RenderSettings, Surface, SurfaceResizer, TargetSlot,
};
use crate::scene::{LoadedScene, Scene, SceneError, SceneLoader};

/// Main engine struct
pub struct Engine {
    /// Scene graph
    pub scene: Scene,

    /// Cameras and the active camera
    pub cameras: ActiveCameraController,

    /// Renderer-global settings
    pub settings: RenderSettings,

    /// Tunable parameters
    pub controls: ControlPanel,

    pipeline: Option<RenderPipeline>,
    resizer: Option<SurfaceResizer>,
    frame_loop: FrameLoop,
    caps: DeviceCapabilities,
    config: ApplicationConfig,
}

impl Engine {
    /// Create an engine on the reference backend
    pub fn new(config: ApplicationConfig) -> Result<Self, EngineError> {
        Self::with_device(config, DeviceCapabilities::reference())
    }

    /// Create an engine for a device described by `caps`
    pub fn with_device(config: ApplicationConfig, caps: DeviceCapabilities) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!("Initializing engine...");

        Ok(Self {
            scene: Scene::new(),
            cameras: ActiveCameraController::new(CameraStore::new()),
            settings: RenderSettings::new(),
            controls: config.control_panel(),
            pipeline: None,
            resizer: None,
            frame_loop: FrameLoop::new(config.engine.max_frame_delta),
            caps,
            config,
        })
    }

    /// Bootstrap a session and drive it until the host stops producing frames
    pub fn run<T: Application>(
        config: ApplicationConfig,
        app: &mut T,
        host: &mut dyn AnimationHost,
        surface: &mut dyn Surface,
    ) -> Result<(), EngineError> {
        crate::foundation::logging::init_with_level(&config.engine.log_level);
        let mut engine = Self::new(config)?;

        app.initialize(&mut engine)
            .map_err(|e| EngineError::Application(format!("App initialization: {e}")))?;
        engine.attach_surface(surface)?;
        engine.start(host);

        log::info!("Starting main loop...");
        while let Some(timestamp) = host.next_frame() {
            engine.handle_resize(surface)?;
            let Some(outcome) = engine.frame(timestamp)? else { break };
            app.after_frame(&mut engine, surface, &outcome)
                .map_err(|e| EngineError::Application(format!("App frame {}: {e}", outcome.frame_index)))?;
        }

        engine.stop(host);
        app.cleanup(&mut engine);
        log::info!("Engine shutdown complete");
        Ok(())
    }

    /// Create the pipeline and the resizer for `surface`
    ///
    /// Requires an active camera. The resizer applies the surface size right
    /// away, so the first frame already renders at the right extent.
    pub fn attach_surface(&mut self, surface: &mut dyn Surface) -> Result<(), EngineError> {
        let camera = self.cameras.require_active()?;
        let mut pipeline = RenderPipeline::new(
            self.caps.clone(),
            camera,
            self.config.pipeline.extent(),
            self.config.pipeline.quality,
        )
        .map_err(|e| EngineError::InitializationFailed(format!("Render pipeline: {e}")))?;
        let resizer = SurfaceResizer::new(surface, self.cameras.store_mut(), camera, Some(&mut pipeline))?;

        self.pipeline = Some(pipeline);
        self.resizer = Some(resizer);
        Ok(())
    }

    /// Process one host frame
    pub fn frame(&mut self, timestamp_ms: f64) -> Result<Option<FrameOutcome>, EngineError> {
        let world = FrameWorld {
            scene: &mut self.scene,
            cameras: &mut self.cameras,
            settings: &mut self.settings,
            controls: &mut self.controls,
            pipeline: self.pipeline.as_mut(),
        };
        Ok(self.frame_loop.on_frame(timestamp_ms, world)?)
    }

    /// Start the frame loop
    pub fn start(&mut self, host: &mut dyn AnimationHost) {
        self.frame_loop.start(host);
    }

    /// Stop the frame loop
    pub fn stop(&mut self, host: &mut dyn AnimationHost) {
        self.frame_loop.stop(host);
    }

    /// Apply a pending surface size change
    pub fn handle_resize(&mut self, surface: &mut dyn Surface) -> Result<Option<Extent>, EngineError> {
        let Some(resizer) = self.resizer.as_mut() else {
            return Ok(None);
        };
        Ok(resizer.handle_resize(surface, self.cameras.store_mut(), self.pipeline.as_mut())?)
    }

    /// Make `handle` the active camera everywhere in one call
    ///
    /// The pipeline picks it up on its next render; the resizer immediately
    /// gives it the surface's aspect ratio. Input rigs follow the active
    /// handle through their tick context.
    pub fn switch_camera(&mut self, handle: CameraHandle) -> Result<(), EngineError> {
        let mut bindings: Vec<&mut dyn CameraBinding> = Vec::with_capacity(2);
        if let Some(pipeline) = self.pipeline.as_mut() {
            bindings.push(pipeline);
        }
        if let Some(resizer) = self.resizer.as_mut() {
            bindings.push(resizer);
        }
        self.cameras.switch_to(handle, &mut bindings)?;

        if let Some(resizer) = self.resizer.as_ref() {
            resizer.sync_camera(self.cameras.store_mut())?;
        }
        Ok(())
    }

    /// Append an animatable to the tick order
    pub fn register_animatable(&mut self, animatable: Box<dyn Animatable>) -> AnimatableId {
        self.frame_loop.register(animatable)
    }

    /// Remove an animatable; returns whether it was registered
    pub fn remove_animatable(&mut self, id: AnimatableId) -> bool {
        self.frame_loop.remove(id).is_some()
    }

    /// Let a loader build its nodes into the scene
    pub fn load_scene(&mut self, loader: &mut dyn SceneLoader) -> Result<LoadedScene, EngineError> {
        let loaded = loader.load(&mut self.scene)?;
        log::info!("Scene loaded: {} birds, {} nodes total", loaded.birds.len(), self.scene.len());
        Ok(loaded)
    }

    /// The render pipeline, once a surface is attached
    pub fn pipeline(&self) -> Option<&RenderPipeline> {
        self.pipeline.as_ref()
    }

    /// The surface resizer, once a surface is attached
    pub fn resizer(&self) -> Option<&SurfaceResizer> {
        self.resizer.as_ref()
    }

    /// The frame loop
    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    /// The most recently presented image
    pub fn presented_frame(&self) -> Option<&FrameBuffer> {
        self.pipeline
            .as_ref()
            .filter(|pipeline| pipeline.frame_count() > 0)
            .map(|pipeline| pipeline.targets().get(TargetSlot::Output))
    }

    /// Engine configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("nodes", &self.scene.len())
            .field("cameras", &self.cameras.store().len())
            .field("pipeline", &self.pipeline)
            .field("frame_loop", &self.frame_loop)
            .finish_non_exhaustive()
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization failed
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration could not be used
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A frame callback failed
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Renderer error outside a frame
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Scene error outside a frame
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The application failed
    #[error("Application error: {0}")]
    Application(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{HeadlessHost, TickContext, TickError};
    use crate::foundation::math::{Vec2, Vec3};
    use crate::render::{Camera, HeadlessSurface};
    use crate::scene::{Material, Node, Shape};

    fn small_config() -> ApplicationConfig {
        let mut config = ApplicationConfig::default();
        config.pipeline = config.pipeline.with_size(16, 12);
        config.ssgi.step_count = 2;
        config.denoise.radius = 1;
        config
    }

    fn engine_with_cameras() -> (Engine, CameraHandle, CameraHandle) {
        let mut engine = Engine::new(small_config()).unwrap();
        engine
            .scene
            .add(Node::mesh("ground", Shape::Plane { half_size: Vec2::new(10.0, 10.0) }, Material::default()));
        let bird = engine
            .cameras
            .add_camera(Camera::perspective(Vec3::new(0.0, 8.0, 8.0), 60.0, 1.0, 0.1, 100.0));
        let first_person = engine
            .cameras
            .add_camera(Camera::perspective(Vec3::new(2.0, 1.6, 2.0), 75.0, 1.0, 0.1, 100.0));
        (engine, bird, first_person)
    }

    struct Counter;

    impl Animatable for Counter {
        fn tick(&mut self, _delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError> {
            ctx.controls.sun.radius += 1.0;
            Ok(())
        }
    }

    #[test]
    fn test_attach_requires_a_camera() {
        let mut engine = Engine::new(small_config()).unwrap();
        let mut surface = HeadlessSurface::new(16, 12);

        assert!(matches!(
            engine.attach_surface(&mut surface),
            Err(EngineError::Render(RenderError::StaleCamera(_)))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config();
        config.engine.max_frame_delta = -1.0;
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_frames_tick_and_render() {
        let (mut engine, _, _) = engine_with_cameras();
        let mut surface = HeadlessSurface::new(16, 12);
        let mut host = HeadlessHost::new(16.0).with_frame_limit(3);
        engine.attach_surface(&mut surface).unwrap();
        let radius = engine.controls.sun.radius;
        engine.register_animatable(Box::new(Counter));

        engine.start(&mut host);
        while let Some(ts) = host.next_frame() {
            engine.frame(ts).unwrap();
        }

        assert_eq!(engine.controls.sun.radius, radius + 3.0);
        assert_eq!(engine.pipeline().unwrap().frame_count(), 3);
        assert_eq!(engine.presented_frame().unwrap().extent(), Extent::new(16, 12));
    }

    #[test]
    fn test_switch_camera_updates_every_binding() {
        let (mut engine, bird, first_person) = engine_with_cameras();
        let mut surface = HeadlessSurface::new(32, 16);
        engine.attach_surface(&mut surface).unwrap();
        assert_eq!(engine.pipeline().unwrap().camera(), bird);

        engine.switch_camera(first_person).unwrap();

        assert_eq!(engine.cameras.active(), Some(first_person));
        assert_eq!(engine.pipeline().unwrap().pending_camera(), Some(first_person));
        assert_eq!(engine.resizer().unwrap().camera(), first_person);
        assert_eq!(engine.cameras.store().get(first_person).unwrap().aspect, 2.0);
    }

    #[test]
    fn test_removed_animatable_stops_ticking() {
        let (mut engine, _, _) = engine_with_cameras();
        let mut host = HeadlessHost::new(16.0);
        let id = engine.register_animatable(Box::new(Counter));
        let radius = engine.controls.sun.radius;

        engine.start(&mut host);
        engine.frame(16.0).unwrap();
        assert!(engine.remove_animatable(id));
        engine.frame(32.0).unwrap();

        assert_eq!(engine.controls.sun.radius, radius + 1.0);
        assert!(!engine.remove_animatable(id));
    }
}
