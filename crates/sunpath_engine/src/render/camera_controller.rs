//! Active camera ownership
//!
//! [`ActiveCameraController`] is the single source of truth for which camera
//! is active. Switching pushes the new handle to every consumer in one call,
//! so the pipeline, the resizer and input controls can never disagree.

use super::primitives::{Camera, CameraHandle, CameraStore};
use super::{RenderError, RenderResult};

/// A component that renders from, sizes, or drives the active camera
pub trait CameraBinding {
    /// Name used in logs
    fn binding_name(&self) -> &'static str;

    /// Receive the newly active camera
    fn bind_camera(&mut self, handle: CameraHandle);
}

/// Owner of the camera store and the active camera handle
#[derive(Debug)]
pub struct ActiveCameraController {
    store: CameraStore,
    active: Option<CameraHandle>,
}

impl ActiveCameraController {
    /// Wrap a store with no active camera yet
    pub fn new(store: CameraStore) -> Self {
        Self { store, active: None }
    }

    /// Add a camera; the first camera added becomes active
    pub fn add_camera(&mut self, camera: Camera) -> CameraHandle {
        let handle = self.store.insert(camera);
        if self.active.is_none() {
            self.active = Some(handle);
        }
        handle
    }

    /// Currently active handle
    pub fn active(&self) -> Option<CameraHandle> {
        self.active
    }

    /// Active handle, failing when none is bound or it went stale
    pub fn require_active(&self) -> RenderResult<CameraHandle> {
        match self.active {
            Some(handle) if self.store.contains(handle) => Ok(handle),
            Some(_) => Err(RenderError::StaleCamera("active camera was removed".to_string())),
            None => Err(RenderError::StaleCamera("no camera has been bound".to_string())),
        }
    }

    /// Borrow the active camera
    pub fn active_camera(&self) -> Option<&Camera> {
        self.active.and_then(|handle| self.store.get(handle))
    }

    /// Mutably borrow the active camera
    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        self.active.and_then(|handle| self.store.get_mut(handle))
    }

    /// Read access to every camera
    pub fn store(&self) -> &CameraStore {
        &self.store
    }

    /// Write access to every camera (rigs move their cameras through this)
    pub fn store_mut(&mut self) -> &mut CameraStore {
        &mut self.store
    }

    /// Make `handle` active and push it to every binding
    ///
    /// Nothing is changed when the handle does not resolve.
    pub fn switch_to(&mut self, handle: CameraHandle, bindings: &mut [&mut dyn CameraBinding]) -> RenderResult<()> {
        if !self.store.contains(handle) {
            return Err(RenderError::StaleCamera(format!("cannot switch to unknown camera {handle:?}")));
        }

        self.active = Some(handle);
        for binding in bindings.iter_mut() {
            binding.bind_camera(handle);
            log::debug!("Camera {:?} pushed to {}", handle, binding.binding_name());
        }

        log::info!("Active camera switched to {:?} ({} bindings updated)", handle, bindings.len());
        Ok(())
    }
}
