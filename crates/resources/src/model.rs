//! Model and mesh loading from glTF files.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::{info, warn};

use crate::error::{ResourceError, ResourceResult};
use crate::material::Material;

/// Decoded texture pixels, always RGBA8.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Tightly packed RGBA8 pixel data
    pub pixels: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// A mesh with de-interleaved vertex attributes and 32-bit indices.
#[derive(Debug, Default)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals, same length as positions
    pub normals: Vec<Vec3>,
    /// Texture coordinates, same length as positions
    pub tex_coords: Vec<Vec2>,
    /// Triangle indices (8- and 16-bit source data is widened)
    pub indices: Vec<u32>,
    /// Index into the owning model's material list
    pub material_index: Option<usize>,
    /// World transform accumulated from the scene node hierarchy
    pub transform: Mat4,
}

impl Mesh {
    /// Returns the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A model: meshes, materials, decoded textures, and bounds.
#[derive(Debug, Default)]
pub struct Model {
    /// Meshes in this model
    pub meshes: Vec<Mesh>,
    /// Materials referenced by the meshes
    pub materials: Vec<Material>,
    /// Decoded RGBA8 textures referenced by the materials
    pub textures: Vec<TextureData>,
    /// Axis-aligned bounding box minimum
    pub aabb_min: Vec3,
    /// Axis-aligned bounding box maximum
    pub aabb_max: Vec3,
}

impl Model {
    /// Loads a model from a .gltf or .glb file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, contains no
    /// meshes, a primitive lacks positions, or image data uses an
    /// unsupported format.
    pub fn load(path: &Path) -> ResourceResult<Self> {
        info!("Loading model from {:?}", path);

        let (document, buffers, images) =
            gltf::import(path).map_err(|e| ResourceError::GltfLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut model = Self {
            aabb_min: Vec3::splat(f32::MAX),
            aabb_max: Vec3::splat(f32::MIN),
            ..Default::default()
        };

        for gltf_material in document.materials() {
            model.materials.push(convert_material(&gltf_material));
        }

        for image in &images {
            model.textures.push(convert_image(image)?);
        }

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());
        if let Some(scene) = scene {
            for node in scene.nodes() {
                load_node(&node, Mat4::IDENTITY, &buffers, &mut model)?;
            }
        }

        if model.meshes.is_empty() {
            return Err(ResourceError::NoMeshes(path.to_path_buf()));
        }

        info!(
            "Loaded model: {} mesh(es), {} material(s), {} texture(s), {} vertices, {} triangles",
            model.meshes.len(),
            model.materials.len(),
            model.textures.len(),
            model.total_vertex_count(),
            model.total_triangle_count()
        );

        Ok(model)
    }

    /// Returns the total vertex count across all meshes.
    pub fn total_vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    /// Returns the total triangle count across all meshes.
    pub fn total_triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        (self.aabb_min + self.aabb_max) * 0.5
    }

    /// Returns the length of the bounding box diagonal.
    pub fn bounding_radius(&self) -> f32 {
        (self.aabb_max - self.aabb_min).length() * 0.5
    }
}

/// Walks a node and its children, loading every triangle primitive with
/// its accumulated world transform.
fn load_node(
    node: &gltf::Node,
    parent_transform: Mat4,
    buffers: &[gltf::buffer::Data],
    model: &mut Model,
) -> ResourceResult<()> {
    let transform = parent_transform * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(gltf_mesh) = node.mesh() {
        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!("Skipping non-triangle primitive ({:?})", primitive.mode());
                continue;
            }
            let mesh = load_primitive(&primitive, transform, buffers)?;
            for position in &mesh.positions {
                let world = transform.transform_point3(*position);
                model.aabb_min = model.aabb_min.min(world);
                model.aabb_max = model.aabb_max.max(world);
            }
            model.meshes.push(mesh);
        }
    }

    for child in node.children() {
        load_node(&child, transform, buffers, model)?;
    }

    Ok(())
}

fn load_primitive(
    primitive: &gltf::Primitive,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
) -> ResourceResult<Mesh> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or(ResourceError::NoPositionData)?
        .map(Vec3::from)
        .collect();

    let normals: Vec<Vec3> = match reader.read_normals() {
        Some(normals) => normals.map(Vec3::from).collect(),
        None => {
            warn!("Primitive has no normals; substituting +Y");
            vec![Vec3::Y; positions.len()]
        }
    };

    let tex_coords: Vec<Vec2> = match reader.read_tex_coords(0) {
        Some(coords) => coords.into_f32().map(Vec2::from).collect(),
        None => vec![Vec2::ZERO; positions.len()],
    };

    let indices = match reader.read_indices() {
        Some(gltf::mesh::util::ReadIndices::U8(iter)) => iter.map(u32::from).collect(),
        Some(gltf::mesh::util::ReadIndices::U16(iter)) => iter.map(u32::from).collect(),
        Some(gltf::mesh::util::ReadIndices::U32(iter)) => iter.collect(),
        // Non-indexed geometry draws every vertex in order
        None => (0..positions.len() as u32).collect(),
    };

    Ok(Mesh {
        positions,
        normals,
        tex_coords,
        indices,
        material_index: primitive.material().index(),
        transform,
    })
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();

    Material {
        name: material.name().map(str::to_owned),
        base_color_texture: pbr.base_color_texture().map(|t| t.texture().source().index()),
        normal_texture: material
            .normal_texture()
            .map(|t| t.texture().source().index()),
        metallic_roughness_texture: pbr
            .metallic_roughness_texture()
            .map(|t| t.texture().source().index()),
        occlusion_texture: material
            .occlusion_texture()
            .map(|t| t.texture().source().index()),
        emissive_texture: material
            .emissive_texture()
            .map(|t| t.texture().source().index()),
        base_color_factor: Vec4::from(pbr.base_color_factor()),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        emissive_factor: Vec3::from(material.emissive_factor()),
    }
}

/// Expands decoded glTF pixel data to RGBA8.
fn convert_image(image: &gltf::image::Data) -> ResourceResult<TextureData> {
    use gltf::image::Format;

    let pixel_count = image.width as usize * image.height as usize;
    let pixels = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => {
            let mut out = Vec::with_capacity(pixel_count * 4);
            for rgb in image.pixels.chunks_exact(3) {
                out.extend_from_slice(rgb);
                out.push(0xFF);
            }
            out
        }
        Format::R8 => {
            let mut out = Vec::with_capacity(pixel_count * 4);
            for &r in &image.pixels {
                out.extend_from_slice(&[r, r, r, 0xFF]);
            }
            out
        }
        Format::R8G8 => {
            let mut out = Vec::with_capacity(pixel_count * 4);
            for rg in image.pixels.chunks_exact(2) {
                out.extend_from_slice(&[rg[0], rg[1], 0x00, 0xFF]);
            }
            out
        }
        other => {
            return Err(ResourceError::UnsupportedImageFormat(format!("{:?}", other)));
        }
    };

    Ok(TextureData {
        pixels,
        width: image.width,
        height: image.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_counts() {
        let mesh = Mesh {
            positions: vec![Vec3::ZERO; 4],
            normals: vec![Vec3::Y; 4],
            tex_coords: vec![Vec2::ZERO; 4],
            indices: vec![0, 1, 2, 2, 1, 3],
            material_index: None,
            transform: Mat4::IDENTITY,
        };
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn model_bounds_helpers() {
        let model = Model {
            aabb_min: Vec3::new(-1.0, -2.0, -3.0),
            aabb_max: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        assert_eq!(model.center(), Vec3::ZERO);
        let expected = Vec3::new(2.0, 4.0, 6.0).length() * 0.5;
        assert!((model.bounding_radius() - expected).abs() < 1e-6);
    }

    #[test]
    fn rgb_image_gains_opaque_alpha() {
        let image = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let texture = convert_image(&image).unwrap();
        assert_eq!(texture.pixels, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn grayscale_image_replicates_channels() {
        let image = gltf::image::Data {
            pixels: vec![128],
            format: gltf::image::Format::R8,
            width: 1,
            height: 1,
        };
        let texture = convert_image(&image).unwrap();
        assert_eq!(texture.pixels, vec![128, 128, 128, 255]);
    }

    #[test]
    fn sixteen_bit_image_is_rejected() {
        let image = gltf::image::Data {
            pixels: vec![0; 8],
            format: gltf::image::Format::R16G16B16A16,
            width: 1,
            height: 1,
        };
        assert!(matches!(
            convert_image(&image),
            Err(ResourceError::UnsupportedImageFormat(_))
        ));
    }
}
