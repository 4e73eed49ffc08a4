//! Scene contents and camera.
//!
//! This crate provides:
//! - [`Camera`] with first-person and orbit modes
//! - [`Scene`] holding GPU meshes, materials, and the draw logic

pub mod camera;
pub mod scene;

pub use camera::{Camera, CameraMode};
pub use scene::{CameraData, GpuMesh, MAX_MATERIALS, Scene};
