//! Scene contents and per-frame draw logic.
//!
//! The scene owns the GPU side of loaded models: vertex/index buffers,
//! uploaded textures, one descriptor set per material plus a default set
//! backed by a 1x1 white texture, the shared uniform buffer, and the
//! pipeline cache that resolves the fill/wireframe variants.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use glam::{Mat3, Mat4, Vec2, Vec3};
use tracing::info;

use meshview_renderer::SceneUbo;
use meshview_resources::Model;
use meshview_rhi::buffer::{Buffer, BufferUsage};
use meshview_rhi::command::{CommandBuffer, CommandPool};
use meshview_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, buffer_info, image_info,
    update_descriptor_sets,
};
use meshview_rhi::device::Device;
use meshview_rhi::pipeline::{CullMode, FrontFace, PipelineLayout, PolygonMode};
use meshview_rhi::pipeline_cache::{PipelineCache, PipelineDesc};
use meshview_rhi::render_pass::RenderPass;
use meshview_rhi::sampler::Sampler;
use meshview_rhi::shader::read_spirv_words;
use meshview_rhi::texture::Texture;
use meshview_rhi::vertex::Vertex;
use meshview_rhi::{RhiError, RhiResult};

/// Per-material texture slot count (base color, normal,
/// metallic-roughness, occlusion, emissive).
pub const TEXTURE_SLOTS: usize = meshview_resources::Material::TEXTURE_SLOTS;

/// Descriptor pool capacity for material sets, plus one default set.
pub const MAX_MATERIALS: usize = 16;

/// Projection near/far planes.
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

/// Model spin rate in degrees per second.
const SPIN_DEG_PER_SEC: f32 = 45.0;

/// Camera state the scene needs each frame.
#[derive(Clone, Copy, Debug)]
pub struct CameraData {
    pub view: Mat4,
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

/// A mesh uploaded to the GPU.
pub struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    material_index: Option<usize>,
}

impl GpuMesh {
    /// Interleaves vertex streams and uploads both buffers.
    pub fn new(
        device: Arc<Device>,
        vertices: &[Vertex],
        indices: &[u32],
        material_index: Option<usize>,
    ) -> RhiResult<Self> {
        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(vertices),
        )?;
        let index_buffer =
            Buffer::new_with_data(device, BufferUsage::Index, bytemuck::cast_slice(indices))?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            material_index,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn material_index(&self) -> Option<usize> {
        self.material_index
    }

    fn draw(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0);
    }
}

/// Maps a mesh's material index to a material descriptor set index.
///
/// Out-of-range or absent indices fall back to the default set (`None`).
pub fn resolve_material_set(material_index: Option<usize>, set_count: usize) -> Option<usize> {
    match material_index {
        Some(index) if index < set_count => Some(index),
        _ => None,
    }
}

/// Renderable scene contents.
pub struct Scene {
    device: Arc<Device>,
    command_pool: CommandPool,

    vertex_spirv: Vec<u32>,
    fragment_spirv: Vec<u32>,

    sampler: Sampler,
    default_texture: Texture,
    textures: Vec<Texture>,

    meshes: Vec<GpuMesh>,

    uniform_buffer: Buffer,
    descriptor_layout: DescriptorSetLayout,
    descriptor_pool: DescriptorPool,
    /// Fallback set: uniform buffer + white texture in every slot.
    default_set: vk::DescriptorSet,
    /// One set per loaded material, indexed like the material list.
    material_sets: Vec<vk::DescriptorSet>,

    pipeline_layout: PipelineLayout,
    pipeline_cache: PipelineCache,
    wireframe: bool,
}

impl Scene {
    /// Creates an empty scene targeting the given render pass.
    ///
    /// Shader bytecode is read from `shader_dir/model.vert.spv` and
    /// `shader_dir/model.frag.spv`.
    ///
    /// # Errors
    ///
    /// Returns an error if shaders cannot be read or any GPU resource
    /// fails to initialize.
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        shader_dir: &Path,
    ) -> RhiResult<Self> {
        let vertex_spirv = read_spirv_words(&shader_dir.join("model.vert.spv"))?;
        let fragment_spirv = read_spirv_words(&shader_dir.join("model.frag.spv"))?;

        let command_pool = CommandPool::new(
            device.clone(),
            device.queue_families().graphics_family.unwrap_or(0),
        )?;

        let sampler = Sampler::linear_repeat(device.clone())?;
        let default_texture = Texture::white_1x1(device.clone(), &command_pool)?;

        let uniform_buffer =
            Buffer::new(device.clone(), BufferUsage::Uniform, SceneUbo::SIZE as u64)?;

        // Binding 0 is the shared uniform block, 1..=5 are the material
        // texture slots.
        let mut bindings = vec![DescriptorBindingBuilder::uniform_buffer(
            0,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
        )];
        for slot in 0..TEXTURE_SLOTS as u32 {
            bindings.push(DescriptorBindingBuilder::combined_image_sampler(
                slot + 1,
                vk::ShaderStageFlags::FRAGMENT,
            ));
        }
        let descriptor_layout = DescriptorSetLayout::new(device.clone(), &bindings)?;

        let set_capacity = (MAX_MATERIALS + 1) as u32;
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: set_capacity,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: TEXTURE_SLOTS as u32 * set_capacity,
            },
        ];
        let descriptor_pool = DescriptorPool::new(device.clone(), set_capacity, &pool_sizes)?;

        let pipeline_layout =
            PipelineLayout::new(device.clone(), &[descriptor_layout.handle()], &[])?;
        let pipeline_cache = PipelineCache::new(device.clone(), render_pass.handle());

        let mut scene = Self {
            device,
            command_pool,
            vertex_spirv,
            fragment_spirv,
            sampler,
            default_texture,
            textures: Vec::new(),
            meshes: Vec::new(),
            uniform_buffer,
            descriptor_layout,
            descriptor_pool,
            default_set: vk::DescriptorSet::null(),
            material_sets: Vec::new(),
            pipeline_layout,
            pipeline_cache,
            wireframe: false,
        };

        let default_view = scene.default_texture.view();
        scene.default_set = scene.allocate_set([default_view; TEXTURE_SLOTS])?;

        Ok(scene)
    }

    /// Uploads a loaded model: textures, materials, and meshes.
    ///
    /// # Errors
    ///
    /// Returns an error if an upload fails or the material count would
    /// exceed the descriptor pool capacity.
    pub fn add_model(&mut self, model: &Model) -> RhiResult<()> {
        if self.material_sets.len() + model.materials.len() > MAX_MATERIALS {
            return Err(RhiError::PipelineError(format!(
                "Too many materials: {} + {} exceeds the limit of {}",
                self.material_sets.len(),
                model.materials.len(),
                MAX_MATERIALS
            )));
        }

        let texture_base = self.textures.len();
        for (i, data) in model.textures.iter().enumerate() {
            let texture = Texture::from_rgba8(
                self.device.clone(),
                &self.command_pool,
                &data.pixels,
                data.width,
                data.height,
                &format!("model_texture_{i}"),
            )?;
            self.textures.push(texture);
        }

        let material_base = self.material_sets.len();
        for material in &model.materials {
            let views = material.texture_slots().map(|slot| {
                slot.map(|index| texture_base + index)
                    .and_then(|index| self.textures.get(index))
                    .map_or(self.default_texture.view(), |texture| texture.view())
            });
            let set = self.allocate_set(views)?;
            self.material_sets.push(set);
        }

        for mesh in &model.meshes {
            let vertices = interleave_vertices(&mesh.positions, &mesh.normals, &mesh.tex_coords);
            let vertices = bake_transform(vertices, mesh.transform);
            let material_index = mesh.material_index.map(|index| material_base + index);
            self.meshes.push(GpuMesh::new(
                self.device.clone(),
                &vertices,
                &mesh.indices,
                material_index,
            )?);
        }

        info!(
            "Scene: +{} mesh(es), +{} material(s), +{} texture(s)",
            model.meshes.len(),
            model.materials.len(),
            model.textures.len()
        );
        Ok(())
    }

    /// Adds the built-in fallback triangle (used when no model path is
    /// given).
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer upload fails.
    pub fn add_triangle(&mut self) -> RhiResult<()> {
        let vertices = [
            Vertex {
                position: Vec3::new(0.0, -0.5, 0.0),
                normal: Vec3::Z,
                tex_coord: Vec2::new(0.5, 0.0),
            },
            Vertex {
                position: Vec3::new(0.5, 0.5, 0.0),
                normal: Vec3::Z,
                tex_coord: Vec2::new(1.0, 1.0),
            },
            Vertex {
                position: Vec3::new(-0.5, 0.5, 0.0),
                normal: Vec3::Z,
                tex_coord: Vec2::new(0.0, 1.0),
            },
        ];
        let indices = [0u32, 1, 2];

        self.meshes.push(GpuMesh::new(
            self.device.clone(),
            &vertices,
            &indices,
            None,
        )?);
        Ok(())
    }

    /// Updates the shared uniform buffer for this frame.
    ///
    /// The model spins around Y at a fixed rate; the projection uses the
    /// camera's field of view with the clip-space Y axis flipped.
    ///
    /// The buffer is single-buffered: the fence wait at frame begin
    /// guarantees the GPU finished reading the previous contents before
    /// this overwrite.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    pub fn update(&mut self, time: f32, aspect: f32, camera: &CameraData) -> RhiResult<()> {
        let model = Mat4::from_rotation_y((time * SPIN_DEG_PER_SEC).to_radians());

        let mut projection =
            Mat4::perspective_rh(camera.fov.to_radians(), aspect, NEAR_PLANE, FAR_PLANE);
        projection.y_axis.y *= -1.0;

        let ubo = SceneUbo::new(model, camera.view, projection, camera.position);
        self.uniform_buffer.upload(bytemuck::bytes_of(&ubo))
    }

    /// Records draws for all meshes into the given command buffer.
    ///
    /// Each mesh binds its material's descriptor set, or the default set
    /// when its material index is absent or out of range.
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline compilation fails on a cache miss.
    pub fn render(&mut self, cmd: &CommandBuffer) -> RhiResult<()> {
        let pipeline = self
            .pipeline_cache
            .get_or_create(&self.pipeline_desc(), &self.pipeline_layout)?;
        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline.handle());

        for mesh in &self.meshes {
            let set = match resolve_material_set(mesh.material_index, self.material_sets.len()) {
                Some(index) => self.material_sets[index],
                None => self.default_set,
            };
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                &[set],
                &[],
            );
            mesh.draw(cmd);
        }

        Ok(())
    }

    /// Flips between fill and wireframe rasterization. The variant
    /// pipeline is compiled once and cached; repeated toggles are free.
    pub fn toggle_wireframe(&mut self) {
        self.wireframe = !self.wireframe;
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.material_sets.len()
    }

    /// Pipeline key for the current rasterization settings.
    fn pipeline_desc(&self) -> PipelineDesc {
        PipelineDesc {
            vertex_spirv: self.vertex_spirv.clone(),
            fragment_spirv: self.fragment_spirv.clone(),
            vertex_bindings: vec![Vertex::binding_description().into()],
            vertex_attributes: Vertex::attribute_descriptions()
                .into_iter()
                .map(Into::into)
                .collect(),
            polygon_mode: if self.wireframe {
                PolygonMode::Line
            } else {
                PolygonMode::Fill
            },
            cull_mode: CullMode::Back,
            front_face: FrontFace::Clockwise,
            depth_test: true,
            depth_write: true,
        }
    }

    /// Allocates a descriptor set and points it at the uniform buffer
    /// and the given texture slot views.
    fn allocate_set(&self, views: [vk::ImageView; TEXTURE_SLOTS]) -> RhiResult<vk::DescriptorSet> {
        let set = self
            .descriptor_pool
            .allocate(&[self.descriptor_layout.handle()])?[0];

        let buffer_infos = [buffer_info(
            self.uniform_buffer.handle(),
            0,
            SceneUbo::SIZE as u64,
        )];
        let image_infos: Vec<vk::DescriptorImageInfo> = views
            .iter()
            .map(|&view| {
                image_info(
                    self.sampler.handle(),
                    view,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                )
            })
            .collect();

        let mut writes = vec![
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_infos),
        ];
        for (slot, info) in image_infos.iter().enumerate() {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(slot as u32 + 1)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(std::slice::from_ref(info)),
            );
        }
        update_descriptor_sets(&self.device, &writes);

        Ok(set)
    }
}

/// Zips the loader's separate attribute streams into interleaved
/// vertices. Missing normals default to +Y, missing tex coords to zero.
pub fn interleave_vertices(
    positions: &[Vec3],
    normals: &[Vec3],
    tex_coords: &[Vec2],
) -> Vec<Vertex> {
    positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: normals.get(i).copied().unwrap_or(Vec3::Y),
            tex_coord: tex_coords.get(i).copied().unwrap_or(Vec2::ZERO),
        })
        .collect()
}

/// Bakes a mesh's node-hierarchy transform into its vertex data so a
/// single model matrix can drive the whole scene.
pub fn bake_transform(mut vertices: Vec<Vertex>, transform: Mat4) -> Vec<Vertex> {
    if transform == Mat4::IDENTITY {
        return vertices;
    }
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
    for vertex in &mut vertices {
        vertex.position = transform.transform_point3(vertex.position);
        vertex.normal = (normal_matrix * vertex.normal).normalize_or_zero();
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_slot_count_matches_material() {
        assert_eq!(TEXTURE_SLOTS, meshview_resources::Material::TEXTURE_SLOTS);
        assert_eq!(TEXTURE_SLOTS, 5);
    }

    #[test]
    fn material_resolution_in_range() {
        assert_eq!(resolve_material_set(Some(0), 3), Some(0));
        assert_eq!(resolve_material_set(Some(2), 3), Some(2));
    }

    #[test]
    fn material_resolution_falls_back_to_default() {
        // Absent index and out-of-range index both use the default set.
        assert_eq!(resolve_material_set(None, 3), None);
        assert_eq!(resolve_material_set(Some(3), 3), None);
        assert_eq!(resolve_material_set(Some(100), 0), None);
    }

    #[test]
    fn interleave_matches_position_count() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = vec![Vec3::Z; 3];
        let tex_coords = vec![Vec2::ONE; 3];

        let vertices = interleave_vertices(&positions, &normals, &tex_coords);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, Vec3::X);
        assert_eq!(vertices[1].normal, Vec3::Z);
        assert_eq!(vertices[1].tex_coord, Vec2::ONE);
    }

    #[test]
    fn interleave_pads_short_streams() {
        let positions = vec![Vec3::ZERO, Vec3::X];
        let vertices = interleave_vertices(&positions, &[], &[]);

        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].normal, Vec3::Y);
        assert_eq!(vertices[0].tex_coord, Vec2::ZERO);
    }

    #[test]
    fn bake_transform_moves_positions_and_rotates_normals() {
        let vertices = vec![Vertex {
            position: Vec3::X,
            normal: Vec3::Z,
            tex_coord: Vec2::ZERO,
        }];
        let transform = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);

        let baked = bake_transform(vertices, transform);
        assert!((baked[0].position - Vec3::new(0.0, 1.0, -1.0)).length() < 1e-5);
        assert!((baked[0].normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn bake_transform_identity_is_untouched() {
        let vertices = vec![Vertex {
            position: Vec3::X,
            normal: Vec3::Y,
            tex_coord: Vec2::ONE,
        }];
        let baked = bake_transform(vertices.clone(), Mat4::IDENTITY);
        assert_eq!(baked[0].position, vertices[0].position);
    }

    #[test]
    fn draw_order_binds_material_then_default() {
        // A model with one textured mesh (material 0) and one untextured
        // mesh must resolve to the material set then the default set.
        let mesh_materials = [Some(0), None];
        let resolved: Vec<Option<usize>> = mesh_materials
            .iter()
            .map(|&index| resolve_material_set(index, 1))
            .collect();
        assert_eq!(resolved, vec![Some(0), None]);
    }
}
