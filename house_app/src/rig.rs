//! Orbit rig driving whichever camera is active

use sunpath_engine::animation::{Animatable, TickContext, TickError};
use sunpath_engine::foundation::math::{Mat4Ext, Mat4, Vec3, Vec4};
use sunpath_engine::render::CameraHandle;

/// Turns the active camera around its look-at point
///
/// The rig follows camera switches on its own: each tick it drives the
/// currently active handle, so switching cameras never needs to reach it.
#[derive(Debug, Clone)]
pub struct OrbitRig {
    degrees_per_second: f32,
    min_distance: f32,
    max_distance: f32,
    driving: Option<CameraHandle>,
}

impl OrbitRig {
    /// Rig auto-rotating at `degrees_per_second`
    pub fn new(degrees_per_second: f32) -> Self {
        Self {
            degrees_per_second,
            min_distance: 1.0,
            max_distance: 200.0,
            driving: None,
        }
    }

    /// Builder-style distance limits
    #[must_use]
    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(0.0);
        self.max_distance = max.max(self.min_distance);
        self
    }

    /// Camera driven on the last tick
    pub fn driving(&self) -> Option<CameraHandle> {
        self.driving
    }
}

impl Animatable for OrbitRig {
    fn name(&self) -> &str {
        "orbit-rig"
    }

    fn tick(&mut self, delta: f32, ctx: &mut TickContext<'_>) -> Result<(), TickError> {
        let Some(handle) = ctx.cameras.active() else {
            return Ok(());
        };
        if self.driving != Some(handle) {
            log::info!("Orbit rig now driving camera {handle:?}");
            self.driving = Some(handle);
        }
        let Some(camera) = ctx.cameras.active_camera_mut() else {
            return Ok(());
        };

        let offset = camera.position - camera.target;
        let distance = offset.norm();
        if distance <= f32::EPSILON {
            return Ok(());
        }

        let rotation = Mat4::rotation_y((self.degrees_per_second * delta).to_radians());
        let turned = rotation * Vec4::new(offset.x, offset.y, offset.z, 0.0);
        let turned = Vec3::new(turned.x, turned.y, turned.z);
        let clamped = distance.clamp(self.min_distance, self.max_distance);

        camera.set_position(camera.target + turned * (clamped / distance));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sunpath_engine::controls::ControlPanel;
    use sunpath_engine::render::{ActiveCameraController, Camera, CameraStore, RenderSettings};
    use sunpath_engine::scene::Scene;

    fn tick(rig: &mut OrbitRig, cameras: &mut ActiveCameraController, delta: f32) {
        let mut scene = Scene::new();
        let mut settings = RenderSettings::new();
        let mut controls = ControlPanel::default();
        let mut ctx = TickContext {
            scene: &mut scene,
            cameras,
            settings: &mut settings,
            controls: &mut controls,
            frame_index: 0,
        };
        rig.tick(delta, &mut ctx).unwrap();
    }

    #[test]
    fn test_quarter_turn_keeps_distance_and_height() {
        let mut cameras = ActiveCameraController::new(CameraStore::new());
        let handle = cameras.add_camera(Camera::perspective(Vec3::new(10.0, 5.0, 0.0), 50.0, 1.0, 0.1, 100.0));
        let mut rig = OrbitRig::new(90.0);

        tick(&mut rig, &mut cameras, 1.0);

        let camera = cameras.store().get(handle).unwrap();
        assert_relative_eq!(camera.position.y, 5.0, epsilon = 1e-5);
        assert_relative_eq!(Vec3::new(camera.position.x, 0.0, camera.position.z).norm(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.x, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_follows_the_active_camera() {
        let mut cameras = ActiveCameraController::new(CameraStore::new());
        let first = cameras.add_camera(Camera::perspective(Vec3::new(10.0, 5.0, 0.0), 50.0, 1.0, 0.1, 100.0));
        let second = cameras.add_camera(Camera::perspective(Vec3::new(0.0, 2.0, 4.0), 75.0, 1.0, 0.1, 100.0));
        let mut rig = OrbitRig::new(45.0);

        tick(&mut rig, &mut cameras, 0.5);
        assert_eq!(rig.driving(), Some(first));

        cameras.switch_to(second, &mut []).unwrap();
        let before = cameras.store().get(first).unwrap().position;
        tick(&mut rig, &mut cameras, 0.5);

        assert_eq!(rig.driving(), Some(second));
        assert_eq!(cameras.store().get(first).unwrap().position, before);
        assert!(cameras.store().get(second).unwrap().position != Vec3::new(0.0, 2.0, 4.0));
    }

    #[test]
    fn test_distance_limits_pull_camera_in() {
        let mut cameras = ActiveCameraController::new(CameraStore::new());
        let handle = cameras.add_camera(Camera::perspective(Vec3::new(0.0, 0.0, 50.0), 50.0, 1.0, 0.1, 100.0));
        let mut rig = OrbitRig::new(0.0).with_distance_limits(1.0, 20.0);

        tick(&mut rig, &mut cameras, 0.016);

        assert_relative_eq!(cameras.store().get(handle).unwrap().position.norm(), 20.0, epsilon = 1e-4);
    }
}
