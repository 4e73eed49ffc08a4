//! Pipeline cache keyed on full pipeline structure.
//!
//! Two pipeline requests share a VkPipeline only when every field of
//! their [`PipelineDesc`] matches, including the complete SPIR-V word
//! streams of both shaders. Descriptions that merely have the same
//! shape (equal counts of bindings or attributes) but different content
//! hash and compare as distinct.

use std::collections::HashMap;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;
use crate::pipeline::{
    CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout, PolygonMode,
};
use crate::shader::{Shader, ShaderStage};

/// Hashable mirror of `vk::VertexInputBindingDescription`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexBindingDesc {
    pub binding: u32,
    pub stride: u32,
    /// Raw `vk::VertexInputRate` value
    pub input_rate: i32,
}

impl From<vk::VertexInputBindingDescription> for VertexBindingDesc {
    fn from(b: vk::VertexInputBindingDescription) -> Self {
        Self {
            binding: b.binding,
            stride: b.stride,
            input_rate: b.input_rate.as_raw(),
        }
    }
}

impl VertexBindingDesc {
    fn to_vk(&self) -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: self.binding,
            stride: self.stride,
            input_rate: vk::VertexInputRate::from_raw(self.input_rate),
        }
    }
}

/// Hashable mirror of `vk::VertexInputAttributeDescription`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttributeDesc {
    pub location: u32,
    pub binding: u32,
    /// Raw `vk::Format` value
    pub format: i32,
    pub offset: u32,
}

impl From<vk::VertexInputAttributeDescription> for VertexAttributeDesc {
    fn from(a: vk::VertexInputAttributeDescription) -> Self {
        Self {
            location: a.location,
            binding: a.binding,
            format: a.format.as_raw(),
            offset: a.offset,
        }
    }
}

impl VertexAttributeDesc {
    fn to_vk(&self) -> vk::VertexInputAttributeDescription {
        vk::VertexInputAttributeDescription {
            location: self.location,
            binding: self.binding,
            format: vk::Format::from_raw(self.format),
            offset: self.offset,
        }
    }
}

/// Complete structural description of a graphics pipeline.
///
/// Serves as the cache key; derives `Hash`/`Eq` over all fields so that
/// any content difference, down to a single shader word, produces a
/// distinct pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    /// Vertex shader SPIR-V code words
    pub vertex_spirv: Vec<u32>,
    /// Fragment shader SPIR-V code words
    pub fragment_spirv: Vec<u32>,
    /// Vertex input bindings
    pub vertex_bindings: Vec<VertexBindingDesc>,
    /// Vertex input attributes
    pub vertex_attributes: Vec<VertexAttributeDesc>,
    /// Polygon rasterization mode
    pub polygon_mode: PolygonMode,
    /// Face culling mode
    pub cull_mode: CullMode,
    /// Front face winding order
    pub front_face: FrontFace,
    /// Depth test enable
    pub depth_test: bool,
    /// Depth write enable
    pub depth_write: bool,
}

/// Cache of graphics pipelines keyed by [`PipelineDesc`].
///
/// All cached pipelines target the same render pass and pipeline
/// layout, which the cache holds fixed at construction.
pub struct PipelineCache {
    device: Arc<Device>,
    render_pass: vk::RenderPass,
    pipelines: HashMap<PipelineDesc, Arc<Pipeline>>,
}

impl PipelineCache {
    /// Creates an empty cache building pipelines for the given render
    /// pass.
    pub fn new(device: Arc<Device>, render_pass: vk::RenderPass) -> Self {
        Self {
            device,
            render_pass,
            pipelines: HashMap::new(),
        }
    }

    /// Returns the cached pipeline for `desc`, compiling it on first
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an error if shader module or pipeline creation fails.
    pub fn get_or_create(
        &mut self,
        desc: &PipelineDesc,
        layout: &PipelineLayout,
    ) -> RhiResult<Arc<Pipeline>> {
        if let Some(pipeline) = self.pipelines.get(desc) {
            return Ok(pipeline.clone());
        }

        debug!(
            "Pipeline cache miss ({} cached): compiling {:?}/{:?}",
            self.pipelines.len(),
            desc.polygon_mode,
            desc.cull_mode
        );

        let vertex_shader = Shader::from_spirv_words(
            self.device.clone(),
            &desc.vertex_spirv,
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_words(
            self.device.clone(),
            &desc.fragment_spirv,
            ShaderStage::Fragment,
            "main",
        )?;

        let bindings: Vec<_> = desc.vertex_bindings.iter().map(|b| b.to_vk()).collect();
        let attributes: Vec<_> = desc.vertex_attributes.iter().map(|a| a.to_vk()).collect();

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_bindings(&bindings)
            .vertex_attributes(&attributes)
            .polygon_mode(desc.polygon_mode)
            .cull_mode(desc.cull_mode)
            .front_face(desc.front_face)
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_write)
            .render_pass(self.render_pass, 0)
            .build(self.device.clone(), layout)?;

        let pipeline = Arc::new(pipeline);
        self.pipelines.insert(desc.clone(), pipeline.clone());
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(desc: &PipelineDesc) -> u64 {
        let mut hasher = DefaultHasher::new();
        desc.hash(&mut hasher);
        hasher.finish()
    }

    fn sample_desc() -> PipelineDesc {
        PipelineDesc {
            vertex_spirv: vec![0x0723_0203, 1, 2, 3],
            fragment_spirv: vec![0x0723_0203, 4, 5, 6],
            vertex_bindings: vec![VertexBindingDesc {
                binding: 0,
                stride: 32,
                input_rate: vk::VertexInputRate::VERTEX.as_raw(),
            }],
            vertex_attributes: vec![VertexAttributeDesc {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT.as_raw(),
                offset: 0,
            }],
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_test: true,
            depth_write: true,
        }
    }

    #[test]
    fn identical_descs_are_equal() {
        let a = sample_desc();
        let b = sample_desc();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn shader_content_distinguishes_descs() {
        let a = sample_desc();
        let mut b = sample_desc();
        // Same word count, one word changed
        *b.fragment_spirv.last_mut().unwrap() = 7;

        assert_eq!(a.fragment_spirv.len(), b.fragment_spirv.len());
        assert_ne!(a, b);
    }

    #[test]
    fn attribute_content_distinguishes_descs() {
        let a = sample_desc();
        let mut b = sample_desc();
        // Same attribute count, different format
        b.vertex_attributes[0].format = vk::Format::R32G32_SFLOAT.as_raw();

        assert_eq!(a.vertex_attributes.len(), b.vertex_attributes.len());
        assert_ne!(a, b);
    }

    #[test]
    fn polygon_mode_distinguishes_descs() {
        let a = sample_desc();
        let mut b = sample_desc();
        b.polygon_mode = PolygonMode::Line;
        assert_ne!(a, b);
    }

    #[test]
    fn desc_works_as_map_key() {
        let mut map: HashMap<PipelineDesc, u32> = HashMap::new();
        map.insert(sample_desc(), 1);

        let mut wireframe = sample_desc();
        wireframe.polygon_mode = PolygonMode::Line;
        map.insert(wireframe.clone(), 2);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&sample_desc()), Some(&1));
        assert_eq!(map.get(&wireframe), Some(&2));
    }

    #[test]
    fn binding_desc_round_trips() {
        let vk_binding = vk::VertexInputBindingDescription {
            binding: 2,
            stride: 48,
            input_rate: vk::VertexInputRate::INSTANCE,
        };
        let desc = VertexBindingDesc::from(vk_binding);
        let back = desc.to_vk();
        assert_eq!(back.binding, 2);
        assert_eq!(back.stride, 48);
        assert_eq!(back.input_rate, vk::VertexInputRate::INSTANCE);
    }
}
