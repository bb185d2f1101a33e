//! Sun path animatable
//!
//! Scene layout created by [`SunPath::new`]:
//!
//! ```text
//! sun-path (group at the path centre)
//! └── sun (group on the path; its world position is the sun)
//!     ├── sun-light (directional light aimed at the path centre)
//!     └── sun-marker (emissive sphere)
//! ```

use crate::animation::{Animatable, TickContext, TickError};
use crate::controls::LightingParams;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::scene::{DirectionalLight, Material, Node, NodeId, NodeKind, Scene, SceneResult, Shape};

use super::ephemeris::{SolarEphemeris, SunPosition};
use super::SunPathParams;

/// Radius of the visible sun sphere
pub const MARKER_RADIUS: f32 = 0.8;

const MARKER_RADIANCE: [f32; 3] = [6.0, 5.2, 3.6];

/// Moves the sun along its daily path
pub struct SunPath {
    anchor: NodeId,
    sun: NodeId,
    light: NodeId,
    marker: NodeId,
    ambient: Option<NodeId>,
    ephemeris: Box<dyn SolarEphemeris>,
    position: SunPosition,
}

impl SunPath {
    /// Build the sun nodes and place them for the initial time
    pub fn new(scene: &mut Scene, params: &SunPathParams, ephemeris: Box<dyn SolarEphemeris>) -> SceneResult<Self> {
        let params = params.sanitized();

        let anchor = scene.add(Node::group("sun-path"));
        let sun = scene.add_child(anchor, Node::group("sun"))?;
        let light = scene.add_child(sun, Node::new("sun-light", NodeKind::DirectionalLight(DirectionalLight::default())))?;
        let marker = scene.add_child(
            sun,
            Node::mesh(
                "sun-marker",
                Shape::Sphere { radius: MARKER_RADIUS },
                Material::emissive(Vec3::from(MARKER_RADIANCE)),
            ),
        )?;

        let position = ephemeris.sun_position(params.latitude, params.longitude, params.utc_offset, &params.time);
        let mut path = Self {
            anchor,
            sun,
            light,
            marker,
            ambient: None,
            ephemeris,
            position,
        };
        path.place(scene, &params)?;

        log::info!(
            "Sun path at {:.4}, {:.4}: azimuth {:.1}, elevation {:.1}",
            params.latitude,
            params.longitude,
            position.azimuth,
            position.elevation
        );
        Ok(path)
    }

    /// Also drive an ambient light's intensity from the lighting parameters
    #[must_use]
    pub fn with_ambient(mut self, ambient: NodeId) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Group whose world position is the sun
    pub fn sun_node(&self) -> NodeId {
        self.sun
    }

    /// Directional light node
    pub fn light_node(&self) -> NodeId {
        self.light
    }

    /// Visible sun sphere
    pub fn marker_node(&self) -> NodeId {
        self.marker
    }

    /// Path centre
    pub fn anchor_node(&self) -> NodeId {
        self.anchor
    }

    /// Last computed sun position
    pub fn position(&self) -> SunPosition {
        self.position
    }

    fn place(&mut self, scene: &mut Scene, params: &SunPathParams) -> SceneResult<()> {
        let centre = Vec3::new(0.0, params.base_y, 0.0);
        let north = Mat4::rotation_y(utils::deg_to_rad(params.north_offset));
        let offset = north.transform_vector(&self.position.to_direction()) * params.radius;

        scene.set_position(self.anchor, centre)?;
        scene.set_position(self.sun, offset)?;
        if let NodeKind::DirectionalLight(light) = &mut scene.node_mut(self.light)?.kind {
            light.target = centre;
        }
        Ok(())
    }

    fn apply_lighting(&self, scene: &mut Scene, lighting: &LightingParams) -> SceneResult<()> {
        if let NodeKind::DirectionalLight(light) = &mut scene.node_mut(self.light)?.kind {
            light.intensity = lighting.sun_intensity;
            light.cast_shadow = lighting.sun_shadows;
        }
        if let Some(ambient) = self.ambient {
            if let NodeKind::AmbientLight { intensity, .. } = &mut scene.node_mut(ambient)?.kind {
                *intensity = lighting.ambient_intensity;
            }
        }
        Ok(())
    }
}

impl Animatable for SunPath {
    fn name(&self) -> &str {
        "sun-path"
    }

    fn tick(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError> {
        let mut params = ctx.controls.sun.sanitized();
        if params.animate_time {
            params.time.advance(f64::from(delta) * f64::from(params.time_speed));
            ctx.controls.sun.time = params.time;
        }

        self.position = self
            .ephemeris
            .sun_position(params.latitude, params.longitude, params.utc_offset, &params.time);
        self.place(ctx.scene, &params)?;
        self.apply_lighting(ctx.scene, &ctx.controls.lighting.sanitized())?;

        log::trace!(
            "Sun at {:02}:{:02}, elevation {:.2}",
            params.time.hour,
            params.time.minute,
            self.position.elevation
        );
        Ok(())
    }
}

impl std::fmt::Debug for SunPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SunPath")
            .field("sun", &self.sun)
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlPanel;
    use crate::render::{ActiveCameraController, CameraStore, RenderSettings};
    use crate::sun::{NoaaEphemeris, SolarTime};
    use approx::assert_relative_eq;

    /// Sun fixed straight up, or at a fixed elevation due north
    struct Fixed(SunPosition);

    impl SolarEphemeris for Fixed {
        fn sun_position(&self, _: f64, _: f64, _: f64, _: &SolarTime) -> SunPosition {
            self.0
        }
    }

    fn tick(scene: &mut Scene, controls: &mut ControlPanel, path: &mut SunPath, delta: f32) {
        let mut cameras = ActiveCameraController::new(CameraStore::new());
        let mut settings = RenderSettings::new();
        let mut ctx = TickContext {
            scene,
            cameras: &mut cameras,
            settings: &mut settings,
            controls,
            frame_index: 0,
        };
        path.tick(delta, &mut ctx).unwrap();
    }

    #[test]
    fn test_sun_sits_on_path_radius() {
        let mut scene = Scene::new();
        let params = SunPathParams {
            base_y: 2.0,
            ..SunPathParams::default()
        };
        let zenith = Fixed(SunPosition { azimuth: 0.0, elevation: 90.0 });
        let path = SunPath::new(&mut scene, &params, Box::new(zenith)).unwrap();

        let sun = scene.world_position(path.sun_node()).unwrap();
        assert_relative_eq!(sun, Vec3::new(0.0, 20.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(scene.world_position(path.light_node()).unwrap(), sun, epsilon = 1e-4);
    }

    #[test]
    fn test_north_offset_rotates_the_path() {
        let mut scene = Scene::new();
        let params = SunPathParams {
            north_offset: 90.0,
            ..SunPathParams::default()
        };
        let north_horizon = Fixed(SunPosition { azimuth: 0.0, elevation: 0.0 });
        let path = SunPath::new(&mut scene, &params, Box::new(north_horizon)).unwrap();

        // North is -Z; a quarter turn around +Y takes it to -X
        let sun = scene.world_position(path.sun_node()).unwrap();
        assert_relative_eq!(sun, Vec3::new(-18.0, 0.0, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn test_animated_time_advances_and_is_written_back() {
        let mut scene = Scene::new();
        let mut controls = ControlPanel::default();
        controls.sun.time = SolarTime::new(2024, 6, 1, 10, 0);
        controls.sun.time_speed = 600.0;
        let mut path = SunPath::new(&mut scene, &controls.sun, Box::new(NoaaEphemeris)).unwrap();

        tick(&mut scene, &mut controls, &mut path, 1.0);

        assert_eq!((controls.sun.time.hour, controls.sun.time.minute), (10, 10));
    }

    #[test]
    fn test_paused_time_stays_put() {
        let mut scene = Scene::new();
        let mut controls = ControlPanel::default();
        controls.sun.animate_time = false;
        let before = controls.sun.time;
        let mut path = SunPath::new(&mut scene, &controls.sun, Box::new(NoaaEphemeris)).unwrap();

        tick(&mut scene, &mut controls, &mut path, 5.0);
        assert_eq!(controls.sun.time, before);
    }

    #[test]
    fn test_lighting_params_reach_the_lights() {
        let mut scene = Scene::new();
        let ambient = scene.add(Node::new(
            "ambient",
            NodeKind::AmbientLight {
                color: Vec3::repeat(1.0),
                intensity: 1.0,
            },
        ));
        let mut controls = ControlPanel::default();
        controls.set_sun_intensity(7.0);
        controls.set_sun_shadows(false);
        controls.set_ambient_intensity(0.25);
        let mut path = SunPath::new(&mut scene, &controls.sun, Box::new(NoaaEphemeris))
            .unwrap()
            .with_ambient(ambient);

        tick(&mut scene, &mut controls, &mut path, 0.0);

        let NodeKind::DirectionalLight(light) = &scene.node(path.light_node()).unwrap().kind else {
            panic!("light node changed kind");
        };
        assert_eq!(light.intensity, 7.0);
        assert!(!light.cast_shadow);
        assert!(matches!(scene.node(ambient).unwrap().kind, NodeKind::AmbientLight { intensity, .. } if intensity == 0.25));
    }
}
