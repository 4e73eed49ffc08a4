//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the GLSL uniform block layouts exactly.
//! All structures use `#[repr(C)]` for predictable memory layout and implement
//! `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame scene uniform data bound at set 0, binding 0.
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: projection matrix (64 bytes)
/// - Offset 192: camera position (12 bytes)
/// - Offset 204: padding (4 bytes)
/// - Total size: 208 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct SceneUbo {
    /// Model matrix (object to world space).
    pub model: Mat4,
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Projection matrix (view to clip space).
    pub projection: Mat4,
    /// Camera world position, used for specular lighting.
    pub camera_position: Vec3,
    /// Padding for 16-byte alignment.
    pub _padding: f32,
}

impl SceneUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(model: Mat4, view: Mat4, projection: Mat4, camera_position: Vec3) -> Self {
        Self {
            model,
            view,
            projection,
            camera_position,
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_ubo_size() {
        // 3 Mat4 (3 * 64) + Vec3 (12) + padding (4) = 208 bytes
        assert_eq!(SceneUbo::SIZE, 208);
    }

    #[test]
    fn scene_ubo_alignment() {
        // Mat4 requires 16-byte alignment on the GPU side
        assert_eq!(std::mem::align_of::<SceneUbo>(), 16);
    }

    #[test]
    fn scene_ubo_field_offsets() {
        assert_eq!(std::mem::offset_of!(SceneUbo, model), 0);
        assert_eq!(std::mem::offset_of!(SceneUbo, view), 64);
        assert_eq!(std::mem::offset_of!(SceneUbo, projection), 128);
        assert_eq!(std::mem::offset_of!(SceneUbo, camera_position), 192);
    }

    #[test]
    fn scene_ubo_pod_roundtrip() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(45.0_f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        let ubo = SceneUbo::new(Mat4::IDENTITY, view, projection, Vec3::new(0.0, 0.0, 5.0));

        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), SceneUbo::SIZE);

        let restored: SceneUbo = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(restored.view, view);
        assert_eq!(restored.camera_position, ubo.camera_position);
    }
}
