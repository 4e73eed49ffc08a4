//! Platform layer for the model viewer.
//!
//! - Window management via winit
//! - Vulkan surface creation (RAII [`Surface`])
//! - Input handling (keyboard, mouse)

mod input;
mod window;

pub use input::{InputState, KeyCode, MouseButton};
pub use window::{Surface, Window};

// Re-export winit types that users might need
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
