//! Input handling for keyboard and mouse.
//!
//! [`InputState`] collects window events into a per-frame snapshot.
//! Deltas accumulate across multiple events within one frame and are
//! cleared by [`InputState::begin_frame`].

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Back/forward and other extra buttons, tracked but unbound.
    Other,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// Tracks the current state of keyboard and mouse input.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently pressed keys
    pressed_keys: HashSet<KeyCode>,
    /// Keys that were just pressed this frame
    just_pressed_keys: HashSet<KeyCode>,

    /// Currently pressed mouse buttons
    pressed_buttons: HashSet<MouseButton>,

    /// Current mouse position
    mouse_position: (f32, f32),
    /// True once at least one cursor position has been seen
    has_mouse_position: bool,
    /// Accumulated mouse movement since last frame
    mouse_delta: (f32, f32),
    /// Accumulated scroll since last frame
    scroll_delta: f32,
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the beginning of each frame to clear per-frame state.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    /// Handle a key press event.
    ///
    /// Key repeat does not re-trigger "just pressed".
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    /// Handle a key release event.
    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    /// Handle a mouse button press event.
    pub fn on_mouse_pressed(&mut self, button: MouseButton) {
        self.pressed_buttons.insert(button);
    }

    /// Handle a mouse button release event.
    pub fn on_mouse_released(&mut self, button: MouseButton) {
        self.pressed_buttons.remove(&button);
    }

    /// Handle mouse movement.
    ///
    /// The first position after startup produces no delta, so the
    /// camera does not jump when the cursor enters the window.
    pub fn on_mouse_moved(&mut self, x: f32, y: f32) {
        if self.has_mouse_position {
            let old = self.mouse_position;
            self.mouse_delta.0 += x - old.0;
            self.mouse_delta.1 += y - old.1;
        }
        self.mouse_position = (x, y);
        self.has_mouse_position = true;
    }

    /// Handle mouse scroll (vertical).
    pub fn on_scroll(&mut self, delta_y: f32) {
        self.scroll_delta += delta_y;
    }

    /// Check if a key is currently pressed.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a key was just pressed this frame.
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Check if a mouse button is currently pressed.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Get the current mouse position.
    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    /// Get the accumulated mouse movement delta since last frame.
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Get the accumulated scroll delta since last frame.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_and_release() {
        let mut input = InputState::new();

        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_just_pressed(KeyCode::KeyW));

        input.begin_frame();
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));

        input.on_key_released(KeyCode::KeyW);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn key_repeat_does_not_retrigger_just_pressed() {
        let mut input = InputState::new();

        input.on_key_pressed(KeyCode::Tab);
        input.begin_frame();
        input.on_key_pressed(KeyCode::Tab);
        assert!(!input.is_key_just_pressed(KeyCode::Tab));

        input.on_key_released(KeyCode::Tab);
        input.on_key_pressed(KeyCode::Tab);
        assert!(input.is_key_just_pressed(KeyCode::Tab));
    }

    #[test]
    fn first_mouse_position_produces_no_delta() {
        let mut input = InputState::new();

        input.on_mouse_moved(400.0, 300.0);
        assert_eq!(input.mouse_delta(), (0.0, 0.0));

        input.on_mouse_moved(410.0, 295.0);
        assert_eq!(input.mouse_delta(), (10.0, -5.0));
    }

    #[test]
    fn mouse_delta_accumulates_within_frame() {
        let mut input = InputState::new();

        input.on_mouse_moved(0.0, 0.0);
        input.on_mouse_moved(3.0, 1.0);
        input.on_mouse_moved(5.0, 4.0);
        assert_eq!(input.mouse_delta(), (5.0, 4.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
        assert_eq!(input.mouse_position(), (5.0, 4.0));
    }

    #[test]
    fn scroll_accumulates_and_clears() {
        let mut input = InputState::new();

        input.on_scroll(1.0);
        input.on_scroll(0.5);
        assert_eq!(input.scroll_delta(), 1.5);

        input.begin_frame();
        assert_eq!(input.scroll_delta(), 0.0);
    }

    #[test]
    fn mouse_buttons_track_held_state() {
        let mut input = InputState::new();

        input.on_mouse_pressed(MouseButton::Left);
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(!input.is_mouse_pressed(MouseButton::Right));

        input.begin_frame();
        assert!(input.is_mouse_pressed(MouseButton::Left));

        input.on_mouse_released(MouseButton::Left);
        assert!(!input.is_mouse_pressed(MouseButton::Left));
    }

    #[test]
    fn winit_button_conversion() {
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Left),
            MouseButton::Left
        );
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Right),
            MouseButton::Right
        );
        assert_eq!(
            MouseButton::from(winit::event::MouseButton::Middle),
            MouseButton::Middle
        );
    }

    #[test]
    fn extra_buttons_do_not_register_as_left() {
        let mut input = InputState::new();

        input.on_mouse_pressed(MouseButton::from(winit::event::MouseButton::Back));
        assert!(!input.is_mouse_pressed(MouseButton::Left));
        assert!(input.is_mouse_pressed(MouseButton::Other));
    }
}
