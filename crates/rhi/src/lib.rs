//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate.
//! It handles:
//! - Instance and device creation
//! - Swapchain management
//! - Render pass and framebuffer lifetime
//! - Command buffer recording
//! - Buffer, image and texture management
//! - Pipeline creation and caching
//! - Synchronization primitives
//!
//! Every wrapper owns exactly one native handle and releases it in `Drop`;
//! none of them implement `Clone`, so ownership transfer is a plain move.

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod framebuffer;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod pipeline_cache;
pub mod render_pass;
pub mod sampler;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
