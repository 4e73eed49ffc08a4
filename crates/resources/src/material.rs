//! Material definitions.

use glam::{Vec3, Vec4};

/// PBR material description loaded from a model file.
///
/// Texture fields index into the owning model's texture list; `None`
/// means the slot has no texture and shaders fall back to the scalar
/// factors.
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name from the source file, if any
    pub name: Option<String>,
    /// Base color (albedo) texture
    pub base_color_texture: Option<usize>,
    /// Tangent-space normal map
    pub normal_texture: Option<usize>,
    /// Metallic-roughness texture (B = metallic, G = roughness)
    pub metallic_roughness_texture: Option<usize>,
    /// Ambient occlusion texture
    pub occlusion_texture: Option<usize>,
    /// Emissive texture
    pub emissive_texture: Option<usize>,
    /// Base color factor
    pub base_color_factor: Vec4,
    /// Metallic factor (0.0 = dielectric, 1.0 = metal)
    pub metallic_factor: f32,
    /// Roughness factor (0.0 = smooth, 1.0 = rough)
    pub roughness_factor: f32,
    /// Emissive color factor
    pub emissive_factor: Vec3,
}

impl Material {
    /// Number of texture slots a material can reference.
    pub const TEXTURE_SLOTS: usize = 5;

    /// Returns the texture slots in binding order: base color, normal,
    /// metallic-roughness, occlusion, emissive.
    pub fn texture_slots(&self) -> [Option<usize>; Self::TEXTURE_SLOTS] {
        [
            self.base_color_texture,
            self.normal_texture,
            self.metallic_roughness_texture,
            self.occlusion_texture,
            self.emissive_texture,
        ]
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_texture: None,
            normal_texture: None,
            metallic_roughness_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            base_color_factor: Vec4::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.5,
            emissive_factor: Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_has_no_textures() {
        let material = Material::default();
        assert!(material.texture_slots().iter().all(Option::is_none));
        assert_eq!(material.base_color_factor, Vec4::ONE);
    }

    #[test]
    fn texture_slots_in_binding_order() {
        let material = Material {
            base_color_texture: Some(0),
            emissive_texture: Some(4),
            ..Default::default()
        };
        let slots = material.texture_slots();
        assert_eq!(slots[0], Some(0));
        assert_eq!(slots[1], None);
        assert_eq!(slots[4], Some(4));
    }
}
