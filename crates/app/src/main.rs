//! Interactive model viewer entry point.
//!
//! Usage: `meshview [MODEL.gltf]` — without a model path a built-in
//! triangle is shown.
//!
//! Controls:
//! - FPS mode: WASD to move, left-drag to look, Space/Shift up/down,
//!   scroll to zoom the field of view
//! - Orbit mode: left-drag to orbit, right-drag to pan, scroll to zoom
//! - Tab toggles the camera mode, I toggles wireframe, Esc exits

use std::path::{Path, PathBuf};

use anyhow::Result;
use glam::Vec3;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use meshview_core::Timer;
use meshview_platform::{InputState, KeyCode, MouseButton, Window};
use meshview_renderer::Renderer;
use meshview_resources::Model;
use meshview_scene::{Camera, CameraData, CameraMode, Scene};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

struct App {
    model_path: Option<PathBuf>,
    // Declaration order doubles as drop order: the scene's GPU resources
    // must go before the renderer tears down the device and instance.
    scene: Option<Scene>,
    renderer: Option<Renderer>,
    window: Option<Window>,
    camera: Camera,
    input: InputState,
    timer: Timer,
    pending_resize: Option<(u32, u32)>,
    /// First fatal error, returned from `main` after the loop exits.
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(model_path: Option<PathBuf>) -> Self {
        Self {
            model_path,
            scene: None,
            renderer: None,
            window: None,
            camera: Camera::new(Vec3::new(0.0, 0.0, 20.0), -90.0, 0.0),
            input: InputState::new(),
            timer: Timer::new(),
            pending_resize: None,
            fatal: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(event_loop, WINDOW_WIDTH, WINDOW_HEIGHT, "meshview")?;
        let mut renderer = Renderer::new(&window, cfg!(debug_assertions))?;
        let [r, g, b, a] = meshview_renderer::CLEAR_COLOR;
        renderer.set_clear_color(r, g, b, a);

        let mut scene = Scene::new(
            renderer.device().clone(),
            renderer.render_pass(),
            Path::new("shaders"),
        )?;

        match &self.model_path {
            Some(path) => {
                let model = Model::load(path)?;
                scene.add_model(&model)?;
                info!("Loaded model: {}", path.display());
            }
            None => {
                scene.add_triangle()?;
                info!("No model specified, rendering triangle");
            }
        }

        info!("Controls:");
        info!("  FPS mode: WASD to move, left-drag to look, Space/Shift for up/down");
        info!("  Orbit mode: left-drag to orbit, right-drag to pan, scroll to zoom");
        info!("  Tab toggles camera mode, I toggles wireframe, Esc exits");

        self.scene = Some(scene);
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    /// Applies the accumulated input snapshot to the camera and scene.
    fn process_input(&mut self, delta: f32) {
        if self.input.is_key_just_pressed(KeyCode::Tab) {
            self.camera.toggle_mode();
            info!(
                "Camera mode: {}",
                match self.camera.mode() {
                    CameraMode::Fps => "FPS",
                    CameraMode::Orbit => "Orbit",
                }
            );
        }
        if self.input.is_key_just_pressed(KeyCode::KeyI)
            && let Some(scene) = &mut self.scene
        {
            scene.toggle_wireframe();
            info!(
                "Wireframe: {}",
                if scene.is_wireframe() { "on" } else { "off" }
            );
        }

        let (mouse_dx, mouse_dy) = self.input.mouse_delta();
        let scroll = self.input.scroll_delta();

        match self.camera.mode() {
            CameraMode::Fps => {
                if self.input.is_key_pressed(KeyCode::KeyW) {
                    self.camera.move_forward(delta);
                }
                if self.input.is_key_pressed(KeyCode::KeyS) {
                    self.camera.move_forward(-delta);
                }
                if self.input.is_key_pressed(KeyCode::KeyD) {
                    self.camera.move_right(delta);
                }
                if self.input.is_key_pressed(KeyCode::KeyA) {
                    self.camera.move_right(-delta);
                }
                if self.input.is_key_pressed(KeyCode::Space) {
                    self.camera.move_up(delta);
                }
                if self.input.is_key_pressed(KeyCode::ShiftLeft) {
                    self.camera.move_up(-delta);
                }

                if self.input.is_mouse_pressed(MouseButton::Left) {
                    self.camera.rotate(mouse_dx, -mouse_dy);
                }
                if scroll != 0.0 {
                    self.camera.adjust_fov(scroll);
                }
            }
            CameraMode::Orbit => {
                if self.input.is_mouse_pressed(MouseButton::Left) {
                    self.camera.orbit(-mouse_dx, mouse_dy);
                }
                if self.input.is_mouse_pressed(MouseButton::Right) {
                    self.camera.pan(mouse_dx, mouse_dy);
                }
                if scroll != 0.0 {
                    self.camera.zoom(scroll);
                }
            }
        }
    }

    fn render_frame(&mut self) -> Result<()> {
        let delta = self.timer.delta_secs();
        self.process_input(delta);

        let (Some(renderer), Some(scene), Some(window)) =
            (&mut self.renderer, &mut self.scene, &self.window)
        else {
            return Ok(());
        };

        // A resize replaces the swapchain; skip this frame and render
        // into the new one next time around.
        if let Some((width, height)) = self.pending_resize.take() {
            renderer.handle_resize(width, height)?;
            return Ok(());
        }
        if renderer.needs_recreate() {
            renderer.handle_resize(window.width(), window.height())?;
            return Ok(());
        }
        if window.is_minimized() {
            return Ok(());
        }

        if renderer.begin_frame()? {
            // The fence wait inside begin_frame guarantees the GPU is no
            // longer reading the uniform buffer this overwrites.
            let camera_data = CameraData {
                view: self.camera.view_matrix(),
                position: self.camera.position(),
                fov: self.camera.fov(),
            };
            scene.update(self.timer.elapsed_secs(), renderer.aspect_ratio(), &camera_data)?;

            if let Some(cmd) = renderer.current_command_buffer() {
                scene.render(cmd)?;
            }
            renderer.end_frame()?;
        }

        Ok(())
    }

    /// Error that ended the event loop, if any. A fatal failure must
    /// surface as a nonzero exit code, not a clean shutdown.
    fn take_fatal(&mut self) -> Result<()> {
        match self.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.init(event_loop)
        {
            error!("Initialization failed: {e:?}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = &mut self.window {
                    window.resize(size.width, size.height);
                }
                if size.width > 0 && size.height > 0 {
                    self.pending_resize = Some((size.width, size.height));
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::PhysicalKey;
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        if key == KeyCode::Escape {
                            event_loop.exit();
                            return;
                        }
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = MouseButton::from(button);
                match state {
                    ElementState::Pressed => {
                        self.input.on_mouse_pressed(button);
                        if button == MouseButton::Left
                            && let Some(window) = &self.window
                        {
                            window.set_cursor_captured(true);
                        }
                    }
                    ElementState::Released => {
                        self.input.on_mouse_released(button);
                        if button == MouseButton::Left
                            && let Some(window) = &self.window
                        {
                            window.set_cursor_captured(false);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .on_mouse_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.input.on_scroll(amount);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_frame() {
                    error!("Render error: {e:?}");
                    self.fatal = Some(e);
                    event_loop.exit();
                }
                // The snapshot is consumed; start accumulating the next
                // frame's deltas.
                self.input.begin_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    meshview_core::init_logging();

    let model_path = std::env::args().nth(1).map(PathBuf::from);
    info!("Starting meshview");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(model_path);
    event_loop.run_app(&mut app)?;
    app.take_fatal()?;

    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_error_fails_the_run() {
        let mut app = App::new(None);
        assert!(app.take_fatal().is_ok());

        app.fatal = Some(anyhow::anyhow!("device lost"));
        assert!(app.take_fatal().is_err());
        // Taking the error drains it.
        assert!(app.take_fatal().is_ok());
    }
}
