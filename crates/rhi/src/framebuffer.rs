//! Framebuffer management.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;
use crate::render_pass::RenderPass;

/// Vulkan framebuffer wrapper.
///
/// Binds a set of image views (color, depth) to a render pass at a
/// fixed extent. One framebuffer exists per swapchain image; all of
/// them share the depth view.
pub struct Framebuffer {
    /// Reference to the logical device
    device: Arc<Device>,
    /// Vulkan framebuffer handle
    framebuffer: vk::Framebuffer,
    /// Framebuffer extent
    extent: vk::Extent2D,
}

impl Framebuffer {
    /// Creates a framebuffer over the given attachments.
    ///
    /// Attachment order must match the render pass: color first, then
    /// depth.
    ///
    /// # Errors
    ///
    /// Returns an error if framebuffer creation fails.
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.handle())
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };

        debug!(
            "Framebuffer created: {}x{}, {} attachment(s)",
            extent.width,
            extent.height,
            attachments.len()
        );

        Ok(Self {
            device,
            framebuffer,
            extent,
        })
    }

    /// Creates one framebuffer per swapchain image view, each sharing
    /// the given depth view.
    ///
    /// # Errors
    ///
    /// Returns an error if any framebuffer creation fails.
    pub fn for_swapchain(
        device: Arc<Device>,
        render_pass: &RenderPass,
        color_views: &[vk::ImageView],
        depth_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> RhiResult<Vec<Self>> {
        color_views
            .iter()
            .map(|&color_view| {
                Self::new(
                    device.clone(),
                    render_pass,
                    &[color_view, depth_view],
                    extent,
                )
            })
            .collect()
    }

    /// Returns the Vulkan framebuffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Returns the framebuffer extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_framebuffer(self.framebuffer, None);
        }
        debug!("Framebuffer destroyed");
    }
}
