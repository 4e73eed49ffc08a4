//! Frame orchestration for the viewer.
//!
//! This crate owns the GPU context and the per-frame protocol:
//! - [`Renderer`] drives begin/end frame, submission, and presentation
//! - [`frame::FramePacer`] tracks the frame slot ring and image indices
//! - [`depth_buffer::DepthBuffer`] backs the depth attachment
//! - [`ubo::SceneUbo`] is the per-frame uniform layout shared with shaders

pub mod depth_buffer;
pub mod error;
pub mod frame;
pub mod renderer;
pub mod ubo;

pub use error::{RendererError, RendererResult};
pub use frame::FramePacer;
pub use renderer::{CLEAR_COLOR, Renderer};
pub use ubo::SceneUbo;

pub use meshview_rhi::sync::MAX_FRAMES_IN_FLIGHT;
