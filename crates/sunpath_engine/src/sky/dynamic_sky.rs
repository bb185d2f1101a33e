//! Per-frame sky update
//!
//! [`DynamicSky`] reads the sun's world position every tick, toggles the
//! sun's visual marker at the horizon, refreshes the sky dome uniforms from
//! the current [`SkyParams`](super::SkyParams) and writes the exposure to
//! the renderer.
//!
//! The tone-mapping exposure is renderer-global. A `DynamicSky` holds the
//! only [`ExposureClaim`] on its [`RenderSettings`] from construction until
//! [`DynamicSky::release`]; no other component may write exposure meanwhile.

use thiserror::Error;

use crate::animation::{Animatable, TickContext, TickError};
use crate::foundation::math::{Transform, Vec3};
use crate::render::{ExposureClaim, RenderError, RenderSettings};
use crate::scene::{Node, NodeId, NodeKind, Scene, SceneError};

use super::sky_model::{SkyUniforms, SKY_DOME_SCALE};

/// Errors raised while setting up the sky
#[derive(Error, Debug)]
pub enum SkyError {
    /// The sun or marker node is missing
    #[error("Sky scene setup failed: {0}")]
    Scene(#[from] SceneError),

    /// Exposure could not be claimed
    #[error("Sky exposure ownership failed: {0}")]
    Render(#[from] RenderError),
}

/// Animatable sky dome driven by the sun's transform
#[derive(Debug)]
pub struct DynamicSky {
    sky: NodeId,
    light: NodeId,
    marker: NodeId,
    claim: ExposureClaim,
}

impl DynamicSky {
    /// Add the sky dome to `scene` and take ownership of the exposure
    ///
    /// `light` is the node whose world position is the sun; `marker` is the
    /// visual sun hidden while below the horizon.
    pub fn new(scene: &mut Scene, settings: &mut RenderSettings, light: NodeId, marker: NodeId) -> Result<Self, SkyError> {
        scene.node(light)?;
        scene.node(marker)?;
        let claim = settings.claim_exposure()?;

        let dome = Node::new("sky", NodeKind::Sky(SkyUniforms::default()))
            .with_transform(Transform::from_position_scale(Vec3::zeros(), Vec3::repeat(SKY_DOME_SCALE)));
        let sky = scene.add(dome);

        log::info!("Dynamic sky created; exposure now owned by the sky");
        Ok(Self { sky, light, marker, claim })
    }

    /// Sky dome node
    pub fn sky_node(&self) -> NodeId {
        self.sky
    }

    /// Give the exposure back to the settings object
    pub fn release(self, settings: &mut RenderSettings) -> Result<(), RenderError> {
        settings.release_exposure(self.claim)
    }
}

impl Animatable for DynamicSky {
    fn name(&self) -> &str {
        "dynamic-sky"
    }

    fn tick(&mut self, _delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError> {
        let sun = ctx.scene.world_position(self.light)?;
        ctx.scene.set_visible(self.marker, sun.y >= 0.0)?;

        let params = ctx.controls.sky.sanitized();
        match &mut ctx.scene.node_mut(self.sky)?.kind {
            NodeKind::Sky(uniforms) => {
                uniforms.turbidity = params.turbidity;
                uniforms.rayleigh = params.rayleigh;
                uniforms.mie_coefficient = params.mie_coefficient;
                uniforms.mie_directional_g = params.mie_directional_g;
                uniforms.sun_position = sun;
            }
            other => {
                return Err(TickError::Custom(format!("sky node holds {other:?} instead of a sky")));
            }
        }

        ctx.settings.set_tone_mapping_exposure(&self.claim, params.exposure)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlPanel;
    use crate::render::{ActiveCameraController, CameraStore};
    use crate::scene::{Material, Shape};

    struct World {
        scene: Scene,
        cameras: ActiveCameraController,
        settings: RenderSettings,
        controls: ControlPanel,
        light: NodeId,
        marker: NodeId,
    }

    impl World {
        fn new() -> Self {
            let mut scene = Scene::new();
            let light = scene.add(Node::group("sun").at(Vec3::new(0.0, 10.0, 0.0)));
            let marker = scene
                .add_child(
                    light,
                    Node::mesh("sun-marker", Shape::Sphere { radius: 1.0 }, Material::emissive(Vec3::repeat(5.0))),
                )
                .unwrap();
            Self {
                scene,
                cameras: ActiveCameraController::new(CameraStore::new()),
                settings: RenderSettings::new(),
                controls: ControlPanel::default(),
                light,
                marker,
            }
        }

        fn tick(&mut self, sky: &mut DynamicSky) {
            let mut ctx = TickContext {
                scene: &mut self.scene,
                cameras: &mut self.cameras,
                settings: &mut self.settings,
                controls: &mut self.controls,
                frame_index: 0,
            };
            sky.tick(0.016, &mut ctx).unwrap();
        }
    }

    #[test]
    fn test_tick_copies_params_and_sun_position() {
        let mut world = World::new();
        let mut sky = DynamicSky::new(&mut world.scene, &mut world.settings, world.light, world.marker).unwrap();
        world.controls.sky.turbidity = 4.0;
        world.controls.sky.exposure = 0.7;

        world.tick(&mut sky);

        let NodeKind::Sky(uniforms) = &world.scene.node(sky.sky_node()).unwrap().kind else {
            panic!("sky node lost its kind");
        };
        assert_eq!(uniforms.turbidity, 4.0);
        assert_eq!(uniforms.sun_position, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(world.settings.tone_mapping_exposure(), 0.7);
    }

    #[test]
    fn test_marker_hidden_below_horizon() {
        let mut world = World::new();
        let mut sky = DynamicSky::new(&mut world.scene, &mut world.settings, world.light, world.marker).unwrap();

        world.tick(&mut sky);
        assert!(world.scene.node(world.marker).unwrap().visible);

        world.scene.set_position(world.light, Vec3::new(0.0, -3.0, 4.0)).unwrap();
        world.tick(&mut sky);
        assert!(!world.scene.node(world.marker).unwrap().visible);
    }

    #[test]
    fn test_second_sky_cannot_claim_exposure() {
        let mut world = World::new();
        let first = DynamicSky::new(&mut world.scene, &mut world.settings, world.light, world.marker).unwrap();

        let second = DynamicSky::new(&mut world.scene, &mut world.settings, world.light, world.marker);
        assert!(matches!(second, Err(SkyError::Render(RenderError::SettingsOwnership(_)))));

        first.release(&mut world.settings).unwrap();
        assert!(!world.settings.is_exposure_claimed());
    }

    #[test]
    fn test_missing_light_fails_construction() {
        let mut world = World::new();
        let light = world.light;
        world.scene.remove(light).unwrap();

        let result = DynamicSky::new(&mut world.scene, &mut world.settings, light, world.marker);
        assert!(matches!(result, Err(SkyError::Scene(_))));
        assert!(!world.settings.is_exposure_claimed());
    }
}
