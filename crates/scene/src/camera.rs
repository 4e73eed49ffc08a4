//! First-person and orbit camera.
//!
//! One struct with a mode tag rather than two camera types. The modes
//! differ only in how position and orientation derive from input, and
//! [`Camera::set_mode`] converts the state in both directions so that
//! toggling causes no visible jump.
//!
//! All angles are stored in degrees.

use glam::{Mat4, Vec3};

/// How input drives the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Free-fly: WASD movement along the basis, mouse look.
    Fps,
    /// Revolve around a target point at a controllable distance.
    Orbit,
}

/// Default movement speed in world units per second.
pub const DEFAULT_MOVE_SPEED: f32 = 2.5;
/// Default mouse sensitivity in degrees per pixel of delta.
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
/// Orbit distance change per scroll unit.
pub const ZOOM_SPEED: f32 = 0.5;
/// Default vertical field of view in degrees.
pub const DEFAULT_FOV: f32 = 45.0;
/// Field of view clamp range in degrees.
pub const MIN_FOV: f32 = 10.0;
pub const MAX_FOV: f32 = 90.0;
/// Closest the orbit camera may get to its target.
pub const MIN_DISTANCE: f32 = 0.5;
/// Farthest the orbit camera may get from its target.
pub const MAX_DISTANCE: f32 = 100.0;

/// Viewer camera with first-person and orbit modes.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,

    /// First-person yaw in degrees.
    yaw: f32,
    /// First-person pitch in degrees, clamped to avoid pole flip.
    pitch: f32,

    mode: CameraMode,

    /// Orbit center.
    target: Vec3,
    /// Distance from target, clamped to [MIN_DISTANCE, MAX_DISTANCE].
    distance: f32,
    /// Orbit yaw in degrees, wraps freely.
    orbit_yaw: f32,
    /// Orbit pitch in degrees, wraps freely (no clamp).
    orbit_pitch: f32,

    move_speed: f32,
    sensitivity: f32,

    /// Vertical field of view in degrees, clamped to [MIN_FOV, MAX_FOV].
    fov: f32,
}

impl Camera {
    /// Creates a camera at `position` with the given first-person angles.
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw,
            pitch,
            mode: CameraMode::Fps,
            target: Vec3::ZERO,
            distance: 0.0,
            orbit_yaw: yaw,
            orbit_pitch: pitch,
            move_speed: DEFAULT_MOVE_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            fov: DEFAULT_FOV,
        };
        camera.update_vectors();

        camera.distance = position.length();
        if camera.distance < MIN_DISTANCE {
            camera.distance = 3.0;
        }

        camera
    }

    /// Right-handed look-at view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_move_speed(&mut self, speed: f32) {
        self.move_speed = speed;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Narrows or widens the field of view (scroll zoom in first-person
    /// mode). Positive delta zooms in.
    pub fn adjust_fov(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(MIN_FOV, MAX_FOV);
    }

    /// Switches modes, converting state so the view does not jump.
    ///
    /// Entering orbit derives distance and orbit angles from the current
    /// position relative to the target. Entering first-person derives
    /// yaw/pitch from the current look direction.
    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode == mode {
            return;
        }

        match mode {
            CameraMode::Orbit => {
                let to_camera = self.position - self.target;
                self.distance = to_camera.length().max(MIN_DISTANCE);

                let dir = to_camera.normalize();
                self.orbit_pitch = dir.y.asin().to_degrees();
                self.orbit_yaw = dir.z.atan2(dir.x).to_degrees();
            }
            CameraMode::Fps => {
                self.yaw = self.front.z.atan2(self.front.x).to_degrees();
                self.pitch = self.front.y.asin().to_degrees();
                self.update_vectors();
            }
        }

        self.mode = mode;
    }

    /// Flips between first-person and orbit mode.
    pub fn toggle_mode(&mut self) {
        self.set_mode(match self.mode {
            CameraMode::Fps => CameraMode::Orbit,
            CameraMode::Orbit => CameraMode::Fps,
        });
    }

    /// Moves along the look direction (first-person).
    pub fn move_forward(&mut self, delta: f32) {
        self.position += self.front * delta * self.move_speed;
    }

    /// Strafes along the right vector (first-person).
    pub fn move_right(&mut self, delta: f32) {
        self.position += self.right * delta * self.move_speed;
    }

    /// Moves along the world up axis (first-person).
    pub fn move_up(&mut self, delta: f32) {
        self.position += self.world_up * delta * self.move_speed;
    }

    /// Mouse look (first-person). Deltas are scaled by sensitivity;
    /// pitch is clamped to avoid flipping over the poles.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw * self.sensitivity;
        self.pitch = (self.pitch + delta_pitch * self.sensitivity).clamp(-89.0, 89.0);

        self.update_vectors();
    }

    /// Revolves around the target (orbit). Pitch wraps freely.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.orbit_yaw += delta_yaw * self.sensitivity;
        self.orbit_pitch += delta_pitch * self.sensitivity;

        self.update_orbit_position();
    }

    /// Moves toward or away from the target (orbit), clamped.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta * ZOOM_SPEED).clamp(MIN_DISTANCE, MAX_DISTANCE);

        self.update_orbit_position();
    }

    /// Moves the orbit target in the screen-space right/up plane.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let offset = self.right * (-delta_x * self.sensitivity * 0.1)
            + self.up * (delta_y * self.sensitivity * 0.1);
        self.target += offset;

        self.update_orbit_position();
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        if self.mode == CameraMode::Orbit {
            self.update_orbit_position();
        }
    }

    /// Rebuilds the orthonormal basis from first-person yaw/pitch.
    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = front.normalize();

        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Recomputes position and basis from orbit state.
    fn update_orbit_position(&mut self) {
        let (yaw, pitch) = (self.orbit_yaw.to_radians(), self.orbit_pitch.to_radians());
        let direction = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.position = self.target + direction * self.distance;

        self.front = (self.target - self.position).normalize();

        // Past the poles the look-at up must flip or the view snaps
        // around as the camera passes overhead.
        let normalized_pitch = self.orbit_pitch.rem_euclid(360.0);
        let upside_down = normalized_pitch > 90.0 && normalized_pitch < 270.0;

        let up = if upside_down {
            -self.world_up
        } else {
            self.world_up
        };
        self.right = self.front.cross(up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    /// Camera at (0, 0, 3) looking down negative Z.
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), -90.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-5;

    fn assert_orthonormal(camera: &Camera) {
        assert!((camera.front().length() - 1.0).abs() < TOLERANCE);
        assert!((camera.right().length() - 1.0).abs() < TOLERANCE);
        assert!((camera.up().length() - 1.0).abs() < TOLERANCE);
        assert!(camera.front().dot(camera.right()).abs() < TOLERANCE);
        assert!(camera.front().dot(camera.up()).abs() < TOLERANCE);
        assert!(camera.right().dot(camera.up()).abs() < TOLERANCE);
    }

    #[test]
    fn basis_is_orthonormal_across_angles() {
        for yaw_step in -18..=18 {
            for pitch_step in -8..=8 {
                let camera =
                    Camera::new(Vec3::ZERO, yaw_step as f32 * 10.0, pitch_step as f32 * 10.0);
                assert_orthonormal(&camera);
            }
        }
    }

    #[test]
    fn default_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.front() - Vec3::NEG_Z).length() < TOLERANCE);
        assert!((camera.right() - Vec3::X).length() < TOLERANCE);
        assert!((camera.up() - Vec3::Y).length() < TOLERANCE);
    }

    #[test]
    fn pitch_clamps_and_holds() {
        let mut camera = Camera::default();
        for _ in 0..10 {
            camera.rotate(0.0, 1000.0);
        }
        assert_eq!(camera.pitch(), 89.0);

        for _ in 0..10 {
            camera.rotate(0.0, -10000.0);
        }
        assert_eq!(camera.pitch(), -89.0);
        assert_orthonormal(&camera);
    }

    #[test]
    fn mode_round_trip_preserves_front() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), -120.0, 25.0);
        let front_before = camera.front();

        camera.set_mode(CameraMode::Orbit);
        camera.set_mode(CameraMode::Fps);

        assert!((camera.front() - front_before).length() < 1e-4);
    }

    #[test]
    fn zoom_clamps_distance() {
        let mut camera = Camera::default();
        camera.set_mode(CameraMode::Orbit);

        camera.zoom(1.0e6);
        assert_eq!(camera.distance(), MIN_DISTANCE);

        camera.zoom(-1.0e6);
        assert_eq!(camera.distance(), MAX_DISTANCE);
    }

    #[test]
    fn fov_clamps_to_range() {
        let mut camera = Camera::default();
        assert_eq!(camera.fov(), DEFAULT_FOV);

        camera.adjust_fov(1000.0);
        assert_eq!(camera.fov(), MIN_FOV);

        camera.adjust_fov(-1000.0);
        assert_eq!(camera.fov(), MAX_FOV);
    }

    #[test]
    fn orbit_pitch_wraps_without_clamp() {
        let mut camera = Camera::default();
        camera.set_mode(CameraMode::Orbit);

        // Drive the orbit pitch well past the pole; the basis must stay
        // orthonormal rather than flipping or degenerating.
        for _ in 0..50 {
            camera.orbit(0.0, 400.0);
            assert_orthonormal(&camera);
        }
    }

    #[test]
    fn orbit_position_stays_on_sphere() {
        let mut camera = Camera::default();
        camera.set_mode(CameraMode::Orbit);
        let distance = camera.distance();

        camera.orbit(123.0, 45.0);
        assert!(((camera.position() - camera.target()).length() - distance).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_in_view_plane() {
        let mut camera = Camera::default();
        camera.set_mode(CameraMode::Orbit);
        let target_before = camera.target();

        camera.pan(100.0, 0.0);
        let shift = camera.target() - target_before;
        assert!(shift.length() > 0.0);
        // Screen-space pan never moves the target along the view axis.
        assert!(shift.dot(camera.front()).abs() < 1e-4);
    }

    #[test]
    fn view_matrix_transforms_target_to_view_axis() {
        let camera = Camera::default();
        let view = camera.view_matrix();

        // A point straight ahead lands on the negative view Z axis.
        let ahead = camera.position() + camera.front() * 2.0;
        let in_view = view.transform_point3(ahead);
        assert!(in_view.x.abs() < TOLERANCE);
        assert!(in_view.y.abs() < TOLERANCE);
        assert!((in_view.z + 2.0).abs() < 1e-4);
    }
}
