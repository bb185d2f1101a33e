//! # 3D Camera System
//!
//! Perspective cameras owned by the application and stored in a
//! [`CameraStore`]. Everything else refers to a camera through a
//! [`CameraHandle`], which must be explicitly rebound and is never assumed to
//! stay valid across frames.
//!
//! ## Coordinate System
//! Right-handed, Y-up world space. The camera looks down -Z in view space and
//! the projection maps depth to `[0, 1]`.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Point3, Vec3};
use crate::render::targets::Extent;

new_key_type! {
    /// Non-owning reference to a camera in a [`CameraStore`]
    pub struct CameraHandle;
}

/// 3D perspective camera
///
/// The projection matrix is cached: changing `fov`, `aspect`, `near` or `far`
/// has no effect on rendering until [`Camera::update_projection`] is called.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    projection: Mat4,
}

impl Camera {
    /// Create a new perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use sunpath_engine::foundation::math::Vec3;
    /// use sunpath_engine::render::Camera;
    ///
    /// let camera = Camera::perspective(Vec3::new(0.0, 2.0, 5.0), 75.0, 16.0 / 9.0, 0.1, 100.0);
    /// assert!(camera.far > camera.near);
    /// ```
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let fov = utils::deg_to_rad(fov_degrees);
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov,
            aspect,
            near,
            far,
            projection: Mat4::perspective(fov, aspect, near, far),
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update camera target (look-at point)
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Configure camera to look at a point with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
    }

    /// Update the aspect ratio
    ///
    /// Only logs changes larger than 0.01 to keep resize storms quiet.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Recompute the cached projection from the current parameters
    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective(self.fov, self.aspect, self.near, self.far);
    }

    /// World-to-view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// View-to-world transform (the camera's world matrix)
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().try_inverse().unwrap_or_else(Mat4::identity)
    }

    /// Cached projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

impl Default for Camera {
    /// Perspective camera above and behind the origin: 45 degree FOV, 16:9
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 3.0, 3.0), 45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// Storage for all cameras of the application
///
/// Cameras are created once and only ever referenced by handle afterwards.
#[derive(Debug, Default)]
pub struct CameraStore {
    cameras: SlotMap<CameraHandle, Camera>,
}

impl CameraStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a camera and return its handle
    pub fn insert(&mut self, camera: Camera) -> CameraHandle {
        self.cameras.insert(camera)
    }

    /// Remove a camera; handles to it become stale
    pub fn remove(&mut self, handle: CameraHandle) -> Option<Camera> {
        self.cameras.remove(handle)
    }

    /// Whether the handle still resolves
    pub fn contains(&self, handle: CameraHandle) -> bool {
        self.cameras.contains_key(handle)
    }

    /// Borrow a camera
    pub fn get(&self, handle: CameraHandle) -> Option<&Camera> {
        self.cameras.get(handle)
    }

    /// Mutably borrow a camera
    pub fn get_mut(&mut self, handle: CameraHandle) -> Option<&mut Camera> {
        self.cameras.get_mut(handle)
    }

    /// Number of cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

/// Immutable snapshot of one camera, taken once per `render()`
///
/// Every pass of a frame reads the same snapshot, so no pass can observe a
/// different camera than another within one frame.
#[derive(Debug, Clone)]
pub struct FrameCamera {
    /// Handle the snapshot was taken from
    pub handle: CameraHandle,
    /// World position of the eye
    pub position: Vec3,
    /// World-to-view transform
    pub view: Mat4,
    /// View-to-world transform
    pub world: Mat4,
    /// Projection used for ray generation
    pub projection: Mat4,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
}

impl FrameCamera {
    /// Snapshot `camera`
    pub fn capture(handle: CameraHandle, camera: &Camera) -> Self {
        let view = camera.view_matrix();
        Self {
            handle,
            position: camera.position,
            world: view.try_inverse().unwrap_or_else(Mat4::identity),
            view,
            projection: camera.projection_matrix(),
            near: camera.near,
            far: camera.far,
        }
    }

    /// View-space direction through the centre of pixel `(x, y)`, with `z = -1`
    pub fn view_ray(&self, x: f32, y: f32, extent: Extent) -> Vec3 {
        let ndc_x = (x + 0.5) / extent.width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (y + 0.5) / extent.height as f32 * 2.0;
        Vec3::new(
            ndc_x / self.projection[(0, 0)],
            ndc_y / self.projection[(1, 1)],
            -1.0,
        )
    }

    /// Normalized world-space direction through the centre of pixel `(x, y)`
    pub fn world_ray(&self, x: u32, y: u32, extent: Extent) -> Vec3 {
        let dir = self.view_ray(x as f32, y as f32, extent);
        self.world.transform_vector(&dir).normalize()
    }

    /// Reconstruct the view-space position of a pixel from normalized depth
    pub fn view_position(&self, x: f32, y: f32, depth: f32, extent: Extent) -> Vec3 {
        self.view_ray(x, y, extent) * (depth * self.far)
    }

    /// Transform a world-space point into view space
    pub fn to_view(&self, point: &Vec3) -> Vec3 {
        self.view.transform_point(&Point3::from(*point)).coords
    }

    /// Transform a world-space direction into view space
    pub fn to_view_dir(&self, dir: &Vec3) -> Vec3 {
        self.view.transform_vector(dir)
    }

    /// Pixels covered by one view-space unit at `view_depth` distance
    pub fn pixels_per_unit(&self, view_depth: f32, extent: Extent) -> f32 {
        self.projection[(1, 1)] * extent.height as f32 * 0.5 / view_depth.max(self.near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame_camera() -> FrameCamera {
        let mut store = CameraStore::new();
        let handle = store.insert(Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 1.0, 0.1, 100.0));
        FrameCamera::capture(handle, store.get(handle).unwrap())
    }

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = Camera::default();
        let before = camera.projection_matrix();

        camera.set_aspect_ratio(1.0);
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection();
        assert_relative_eq!(camera.projection_matrix()[(0, 0)], camera.projection_matrix()[(1, 1)], epsilon = 1e-6);
    }

    #[test]
    fn test_centre_ray_points_at_target() {
        let camera = frame_camera();
        let ray = camera.world_ray(50, 50, Extent::new(101, 101));

        assert_relative_eq!(ray.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ray.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ray.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_position_round_trips_depth() {
        let camera = frame_camera();
        let extent = Extent::new(64, 64);
        let world_point = Vec3::new(0.0, 0.0, -10.0);

        let view = camera.to_view(&world_point);
        let depth = -view.z / camera.far;
        let rebuilt = camera.view_position(31.5, 31.5, depth, extent);

        assert_relative_eq!(rebuilt.z, view.z, epsilon = 1e-4);
    }

    #[test]
    fn test_removed_camera_handle_is_stale() {
        let mut store = CameraStore::new();
        let handle = store.insert(Camera::default());
        store.remove(handle);
        assert!(!store.contains(handle));
        assert!(store.is_empty());
    }
}
