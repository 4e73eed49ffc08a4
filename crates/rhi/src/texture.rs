//! Sampled texture management.
//!
//! A [`Texture`] is an RGBA8 image uploaded through a staging buffer
//! and transitioned to SHADER_READ_ONLY_OPTIMAL, ready to be bound as a
//! combined image sampler.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::{Image, layout_transition_barrier};

/// GPU texture in SHADER_READ_ONLY_OPTIMAL layout.
pub struct Texture {
    image: Image,
    width: u32,
    height: u32,
}

impl Texture {
    /// Creates a texture from tightly packed RGBA8 pixel data.
    ///
    /// The pixels are copied through a staging buffer on the given
    /// command pool's queue; the call blocks until the upload finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` does not match `width * height * 4`
    /// bytes or any GPU operation fails.
    pub fn from_rgba8(
        device: Arc<Device>,
        command_pool: &CommandPool,
        pixels: &[u8],
        width: u32,
        height: u32,
        name: &str,
    ) -> RhiResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RhiError::BufferError(format!(
                "Texture '{}' pixel data is {} bytes, expected {} ({}x{}x4)",
                name,
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;

        let image = Image::new(
            device.clone(),
            width,
            height,
            vk::Format::R8G8B8A8_SRGB,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::ImageAspectFlags::COLOR,
            name,
        )?;

        command_pool.submit_one_time(|cmd| {
            let to_transfer = layout_transition_barrier(
                image.handle(),
                vk::ImageAspectFlags::COLOR,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::AccessFlags::empty(),
                vk::AccessFlags::TRANSFER_WRITE,
            );
            cmd.pipeline_barrier(
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                &[to_transfer],
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(0)
                        .base_array_layer(0)
                        .layer_count(1),
                )
                .image_offset(vk::Offset3D::default())
                .image_extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                });
            cmd.copy_buffer_to_image(
                staging.handle(),
                image.handle(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_sampled = layout_transition_barrier(
                image.handle(),
                vk::ImageAspectFlags::COLOR,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::SHADER_READ,
            );
            cmd.pipeline_barrier(
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                &[to_sampled],
            );
        })?;

        debug!("Uploaded texture '{}': {}x{}", name, width, height);

        Ok(Self {
            image,
            width,
            height,
        })
    }

    /// Creates a 1x1 opaque white texture.
    ///
    /// Bound wherever a material has no texture in a slot, so shaders
    /// can sample unconditionally.
    pub fn white_1x1(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        Self::from_rgba8(device, command_pool, &[0xFF, 0xFF, 0xFF, 0xFF], 1, 1, "white-1x1")
    }

    /// Returns the image view for descriptor writes.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Returns the texture width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the texture height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }
}
