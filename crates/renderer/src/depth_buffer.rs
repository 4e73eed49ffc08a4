//! Depth buffer management.
//!
//! Wraps a GPU-only depth image sized to the swapchain. Recreated on resize
//! together with the framebuffers.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use meshview_rhi::device::Device;
use meshview_rhi::image::Image;
use meshview_rhi::{RhiError, RhiResult};

/// Default depth format (32-bit floating point depth).
pub const DEFAULT_DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Depth attachment backing the render pass.
pub struct DepthBuffer {
    image: Image,
    width: u32,
    height: u32,
}

impl DepthBuffer {
    /// Creates a depth buffer with the given dimensions and format.
    pub fn new(device: Arc<Device>, width: u32, height: u32, format: vk::Format) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::SwapchainError(format!(
                "invalid depth buffer dimensions {width}x{height}"
            )));
        }

        let image = Image::new(
            device,
            width,
            height,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::ImageAspectFlags::DEPTH,
            "depth_buffer",
        )?;

        debug!(width, height, ?format, "Created depth buffer");

        Ok(Self {
            image,
            width,
            height,
        })
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.image.view()
    }

    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_d32_sfloat() {
        assert_eq!(DEFAULT_DEPTH_FORMAT, vk::Format::D32_SFLOAT);
    }
}
