//! Core primitive types for rendering
//!
//! Cameras, the handle type that refers to them, and the per-frame snapshot
//! the passes read.

pub mod camera;

pub use camera::{Camera, CameraHandle, CameraStore, FrameCamera};
