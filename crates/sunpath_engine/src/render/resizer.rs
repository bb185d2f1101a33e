//! Surface resize propagation
//!
//! Keeps the bound camera's aspect ratio, the surface backing store and the
//! pipeline's targets in step with the client size of the surface.

use super::camera_controller::CameraBinding;
use super::graph::{RenderPipeline, ResizeOutcome};
use super::primitives::{CameraHandle, CameraStore};
use super::surface::Surface;
use super::targets::Extent;
use super::{RenderError, RenderResult};

/// Applies surface size changes to the camera and the pipeline
#[derive(Debug, Clone)]
pub struct SurfaceResizer {
    camera: CameraHandle,
    last: Extent,
    client_aspect: Option<f32>,
}

impl SurfaceResizer {
    /// Create the resizer and apply the current surface size right away
    ///
    /// The pipeline may not exist yet; its resize step is then skipped.
    pub fn new(
        surface: &mut dyn Surface,
        cameras: &mut CameraStore,
        camera: CameraHandle,
        pipeline: Option<&mut RenderPipeline>,
    ) -> RenderResult<Self> {
        let mut resizer = Self {
            camera,
            last: Extent::new(0, 0),
            client_aspect: None,
        };
        resizer.apply(surface, cameras, pipeline)?;
        Ok(resizer)
    }

    /// Apply the surface's current size
    ///
    /// A zero-sized client area is ignored and the last valid size kept.
    pub fn apply(
        &mut self,
        surface: &mut dyn Surface,
        cameras: &mut CameraStore,
        pipeline: Option<&mut RenderPipeline>,
    ) -> RenderResult<Extent> {
        let (width, height) = surface.client_size();
        if width == 0 || height == 0 {
            log::warn!("Ignoring {width}x{height} surface size; keeping {}", self.last);
            return Ok(self.last);
        }

        let ratio = surface.pixel_ratio();
        let physical = Extent::new(
            ((width as f32 * ratio).round() as u32).max(1),
            ((height as f32 * ratio).round() as u32).max(1),
        );

        if let Some(pipeline) = pipeline.as_deref() {
            if !pipeline.accepts(physical) {
                log::warn!("Rejected surface size {physical}; keeping {}", self.last);
                return Ok(self.last);
            }
        }

        self.client_aspect = Some(width as f32 / height as f32);
        self.sync_camera(cameras)?;

        surface.set_size(physical);

        if let Some(pipeline) = pipeline {
            if pipeline.resize(physical.width, physical.height) == ResizeOutcome::Rejected {
                log::warn!("Pipeline kept {} after surface resize to {physical}", pipeline.extent());
            }
        }

        if physical != self.last {
            log::debug!("Surface sized to {physical} (client {width}x{height}, ratio {ratio})");
        }
        self.last = physical;
        Ok(physical)
    }

    /// Apply the size if the surface reported a change
    pub fn handle_resize(
        &mut self,
        surface: &mut dyn Surface,
        cameras: &mut CameraStore,
        pipeline: Option<&mut RenderPipeline>,
    ) -> RenderResult<Option<Extent>> {
        if !surface.take_resize_event() {
            return Ok(None);
        }
        self.apply(surface, cameras, pipeline).map(Some)
    }

    /// Give the bound camera the aspect ratio of the last applied size
    ///
    /// Used after a camera switch so the new camera matches the surface
    /// without waiting for the next resize notification.
    pub fn sync_camera(&self, cameras: &mut CameraStore) -> RenderResult<()> {
        let camera = cameras
            .get_mut(self.camera)
            .ok_or_else(|| RenderError::StaleCamera(format!("resizer camera {:?} does not resolve", self.camera)))?;
        if let Some(aspect) = self.client_aspect {
            camera.set_aspect_ratio(aspect);
            camera.update_projection();
        }
        Ok(())
    }

    /// Camera whose projection is kept in sync
    pub fn camera(&self) -> CameraHandle {
        self.camera
    }

    /// Last physical extent applied
    pub fn last_extent(&self) -> Extent {
        self.last
    }
}

impl CameraBinding for SurfaceResizer {
    fn binding_name(&self) -> &'static str {
        "surface-resizer"
    }

    fn bind_camera(&mut self, handle: CameraHandle) {
        self.camera = handle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::device::DeviceCapabilities;
    use crate::render::graph::Quality;
    use crate::render::primitives::Camera;
    use crate::render::surface::HeadlessSurface;
    use approx::assert_relative_eq;

    fn store() -> (CameraStore, CameraHandle) {
        let mut cameras = CameraStore::new();
        let handle = cameras.insert(Camera::perspective(Vec3::new(0.0, 1.0, 5.0), 50.0, 1.0, 0.1, 100.0));
        (cameras, handle)
    }

    #[test]
    fn test_construction_applies_size_without_pipeline() {
        let (mut cameras, handle) = store();
        let mut surface = HeadlessSurface::new(800, 600);

        let resizer = SurfaceResizer::new(&mut surface, &mut cameras, handle, None).unwrap();

        assert_eq!(resizer.last_extent(), Extent::new(800, 600));
        assert_eq!(surface.backing_size(), Extent::new(800, 600));
        assert_relative_eq!(cameras.get(handle).unwrap().aspect, 800.0 / 600.0);
    }

    #[test]
    fn test_resize_reaches_pipeline_in_physical_pixels() {
        let (mut cameras, handle) = store();
        let mut surface = HeadlessSurface::new(40, 30).with_pixel_ratio(2.0);
        let mut pipeline =
            RenderPipeline::new(DeviceCapabilities::reference(), handle, Extent::new(8, 8), Quality::Desktop).unwrap();
        let mut resizer = SurfaceResizer::new(&mut surface, &mut cameras, handle, Some(&mut pipeline)).unwrap();
        assert_eq!(pipeline.extent(), Extent::new(80, 60));

        surface.simulate_resize(64, 16);
        let applied = resizer.handle_resize(&mut surface, &mut cameras, Some(&mut pipeline)).unwrap();

        assert_eq!(applied, Some(Extent::new(128, 32)));
        assert_eq!(pipeline.extent(), Extent::new(128, 32));
        assert_relative_eq!(cameras.get(handle).unwrap().aspect, 4.0);
        // No pending event: nothing happens
        assert_eq!(resizer.handle_resize(&mut surface, &mut cameras, Some(&mut pipeline)).unwrap(), None);
    }

    #[test]
    fn test_oversized_resize_leaves_everything_untouched() {
        let (mut cameras, handle) = store();
        let mut surface = HeadlessSurface::new(800, 600);
        let mut pipeline =
            RenderPipeline::new(DeviceCapabilities::reference(), handle, Extent::new(8, 8), Quality::Desktop).unwrap();
        let mut resizer = SurfaceResizer::new(&mut surface, &mut cameras, handle, Some(&mut pipeline)).unwrap();

        surface.simulate_resize(9000, 10);
        let applied = resizer.handle_resize(&mut surface, &mut cameras, Some(&mut pipeline)).unwrap();

        assert_eq!(applied, Some(Extent::new(800, 600)));
        assert_eq!(resizer.last_extent(), Extent::new(800, 600));
        assert_eq!(pipeline.extent(), Extent::new(800, 600));
        assert_eq!(surface.backing_size(), Extent::new(800, 600));
        assert_relative_eq!(cameras.get(handle).unwrap().aspect, 800.0 / 600.0);

        // The next valid size goes through as usual
        surface.simulate_resize(400, 100);
        resizer.handle_resize(&mut surface, &mut cameras, Some(&mut pipeline)).unwrap();
        assert_eq!(pipeline.extent(), Extent::new(400, 100));
        assert_relative_eq!(cameras.get(handle).unwrap().aspect, 4.0);
    }

    #[test]
    fn test_zero_client_size_keeps_last() {
        let (mut cameras, handle) = store();
        let mut surface = HeadlessSurface::new(320, 200);
        let mut resizer = SurfaceResizer::new(&mut surface, &mut cameras, handle, None).unwrap();

        surface.simulate_resize(0, 200);
        let applied = resizer.handle_resize(&mut surface, &mut cameras, None).unwrap();

        assert_eq!(applied, Some(Extent::new(320, 200)));
        assert_eq!(surface.resize_calls(), 1);
    }

    #[test]
    fn test_rebound_camera_gets_current_aspect() {
        let (mut cameras, first) = store();
        let second = cameras.insert(Camera::perspective(Vec3::new(2.0, 1.0, 5.0), 50.0, 1.0, 0.1, 100.0));
        let mut surface = HeadlessSurface::new(300, 100);
        let mut resizer = SurfaceResizer::new(&mut surface, &mut cameras, first, None).unwrap();

        resizer.bind_camera(second);
        resizer.sync_camera(&mut cameras).unwrap();

        assert_eq!(resizer.camera(), second);
        assert_relative_eq!(cameras.get(second).unwrap().aspect, 3.0);
    }

    #[test]
    fn test_stale_camera_fails_fast() {
        let (mut cameras, handle) = store();
        let mut surface = HeadlessSurface::new(320, 200);
        cameras.remove(handle);

        let result = SurfaceResizer::new(&mut surface, &mut cameras, handle, None);
        assert!(matches!(result, Err(RenderError::StaleCamera(_))));
    }
}
