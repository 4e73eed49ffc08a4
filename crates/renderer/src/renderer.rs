//! Frame lifecycle orchestration.
//!
//! [`Renderer`] owns the Vulkan instance, surface, device, swapchain,
//! render pass, depth buffer, and all frame synchronization objects, and
//! drives the begin/end frame protocol.
//!
//! Synchronization objects live in two index spaces. The acquire
//! semaphore and in-flight fence are per frame slot (the two-deep ring),
//! because the frame slot is known before acquire. The render-finished
//! semaphore, command buffer, and framebuffer are per swapchain image,
//! because they follow whatever image the swapchain hands back.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use ash::vk;
use tracing::{info, warn};

use meshview_platform::{Surface, Window};
use meshview_rhi::command::{CommandBuffer, CommandPool};
use meshview_rhi::device::Device;
use meshview_rhi::framebuffer::Framebuffer;
use meshview_rhi::instance::Instance;
use meshview_rhi::physical_device::select_physical_device;
use meshview_rhi::render_pass::RenderPass;
use meshview_rhi::swapchain::{AcquireResult, Swapchain};
use meshview_rhi::sync::{FrameInFlight, MAX_FRAMES_IN_FLIGHT, Semaphore};

use crate::depth_buffer::{DEFAULT_DEPTH_FORMAT, DepthBuffer};
use crate::error::{RendererError, RendererResult};
use crate::frame::FramePacer;

/// Viewer background color (cornflower blue). The renderer itself
/// defaults to black; the application picks the background through
/// [`Renderer::set_clear_color`].
pub const CLEAR_COLOR: [f32; 4] = [0.39, 0.58, 0.93, 1.0];

/// Owns the GPU context and runs the per-frame protocol.
///
/// A frame is driven as `begin_frame` / record draws / `end_frame`.
/// `begin_frame` returning `false` means the swapchain was stale and the
/// frame was skipped; call [`Renderer::handle_resize`] and try again next
/// frame.
pub struct Renderer {
    frame_pacer: FramePacer,
    /// Per-frame-slot sync objects, indexed by the frame slot.
    frames: Vec<FrameInFlight>,
    /// Per-image render-finished semaphores, indexed by image index.
    render_finished: Vec<Semaphore>,
    /// Per-image command buffers, indexed by image index.
    command_buffers: Vec<CommandBuffer>,
    framebuffers: Vec<Framebuffer>,
    command_pool: ManuallyDrop<CommandPool>,
    depth_buffer: ManuallyDrop<DepthBuffer>,
    render_pass: ManuallyDrop<RenderPass>,
    swapchain: ManuallyDrop<Swapchain>,
    device: Arc<Device>,
    surface: ManuallyDrop<Surface>,
    instance: ManuallyDrop<Instance>,
    /// Set when acquire or present reported a stale swapchain.
    swapchain_stale: bool,
    clear_color: [f32; 4],
}

impl Renderer {
    /// Creates the full GPU context for the given window.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan object fails to initialize or no
    /// suitable GPU is found.
    pub fn new(window: &Window, enable_validation: bool) -> RendererResult<Self> {
        let display_handle = window
            .display_handle()
            .map_err(|e| {
                meshview_core::Error::Window(format!("Failed to get display handle: {e}"))
            })?
            .as_raw();

        let instance = Instance::new(display_handle, enable_validation)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        info!("Using GPU: {}", physical_device_info.device_name());

        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            window.width(),
            window.height(),
        )?;

        let render_pass = RenderPass::new(device.clone(), swapchain.format(), DEFAULT_DEPTH_FORMAT)?;

        let extent = swapchain.extent();
        let depth_buffer =
            DepthBuffer::new(device.clone(), extent.width, extent.height, DEFAULT_DEPTH_FORMAT)?;

        let framebuffers = Framebuffer::for_swapchain(
            device.clone(),
            &render_pass,
            swapchain.image_views(),
            depth_buffer.image_view(),
            extent,
        )?;

        let command_pool =
            CommandPool::new(device.clone(), device.queue_families().graphics_family.unwrap_or(0))?;

        let image_count = swapchain.image_count() as usize;
        let command_buffers = command_pool
            .allocate_command_buffers(image_count as u32)?
            .into_iter()
            .map(|handle| CommandBuffer::from_handle(device.clone(), handle))
            .collect();

        let render_finished = (0..image_count)
            .map(|_| Semaphore::new(device.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let frames = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameInFlight::new(device.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Renderer initialized: {}x{}, {} swapchain images, {} frames in flight",
            extent.width, extent.height, image_count, MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            frame_pacer: FramePacer::new(),
            frames,
            render_finished,
            command_buffers,
            framebuffers,
            command_pool: ManuallyDrop::new(command_pool),
            depth_buffer: ManuallyDrop::new(depth_buffer),
            render_pass: ManuallyDrop::new(render_pass),
            swapchain: ManuallyDrop::new(swapchain),
            device,
            surface: ManuallyDrop::new(surface),
            instance: ManuallyDrop::new(instance),
            swapchain_stale: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        })
    }

    /// Begins a frame: waits for the frame slot's fence, acquires a
    /// swapchain image, and opens the render pass on the image's command
    /// buffer.
    ///
    /// Returns `false` if the swapchain was out of date. In that case the
    /// fence stays signaled and the acquire semaphore unconsumed, so the
    /// slot can be retried after [`Renderer::handle_resize`].
    ///
    /// # Errors
    ///
    /// Returns an error on any GPU failure other than a stale swapchain.
    pub fn begin_frame(&mut self) -> RendererResult<bool> {
        let frame = &self.frames[self.frame_pacer.current_frame()];
        frame.in_flight().wait(u64::MAX)?;

        let image_index = match self
            .swapchain
            .acquire_next_image(frame.image_available().handle())?
        {
            AcquireResult::Acquired {
                image_index,
                suboptimal,
            } => {
                if suboptimal {
                    self.swapchain_stale = true;
                }
                image_index
            }
            AcquireResult::OutOfDate => {
                // The fence was not reset and the semaphore was not
                // consumed, so this slot is reusable as-is.
                self.swapchain_stale = true;
                self.frame_pacer.begin(None);
                return Ok(false);
            }
        };

        // Reset only once we know work will be submitted for this slot.
        frame.in_flight().reset()?;
        self.frame_pacer.begin(Some(image_index));

        let cmd = &self.command_buffers[image_index as usize];
        cmd.reset()?;
        cmd.begin()?;

        let extent = self.swapchain.extent();
        let clear_values = clear_values(self.clear_color);
        cmd.begin_render_pass(
            self.render_pass.handle(),
            self.framebuffers[image_index as usize].handle(),
            extent,
            &clear_values,
        );

        cmd.set_viewport(&vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        cmd.set_scissor(&vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        });

        Ok(true)
    }

    /// Ends the frame: closes the render pass, submits, and presents.
    ///
    /// A no-op if `begin_frame` skipped this frame.
    ///
    /// # Errors
    ///
    /// Returns an error if command buffer recording, queue submission,
    /// or presentation fails.
    pub fn end_frame(&mut self) -> RendererResult<()> {
        let Some(image_index) = self.frame_pacer.active_image() else {
            return Ok(());
        };

        let cmd = &self.command_buffers[image_index as usize];
        cmd.end_render_pass();
        cmd.end()?;

        let frame = &self.frames[self.frame_pacer.current_frame()];
        let wait_semaphores = [frame.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished[image_index as usize].handle()];
        let command_buffers = [cmd.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                frame.in_flight().handle(),
            )
        }
        .map_err(meshview_rhi::RhiError::from)?;

        let stale = self.swapchain.present(
            self.device.present_queue(),
            image_index,
            self.render_finished[image_index as usize].handle(),
        )?;
        if stale {
            self.swapchain_stale = true;
        }

        self.frame_pacer.end();
        Ok(())
    }

    /// Recreates the swapchain-dependent resources for a new window size.
    ///
    /// A no-op while the window is minimized (zero-sized).
    ///
    /// # Errors
    ///
    /// Returns an error if recreation of any resource fails.
    pub fn handle_resize(&mut self, width: u32, height: u32) -> RendererResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.device.wait_idle()?;

        self.swapchain
            .recreate(&self.instance, self.surface.handle(), width, height)?;
        let extent = self.swapchain.extent();

        let depth_buffer =
            DepthBuffer::new(self.device.clone(), extent.width, extent.height, DEFAULT_DEPTH_FORMAT)?;
        let old_depth = std::mem::replace(&mut self.depth_buffer, ManuallyDrop::new(depth_buffer));
        drop(ManuallyDrop::into_inner(old_depth));

        self.framebuffers = Framebuffer::for_swapchain(
            self.device.clone(),
            &self.render_pass,
            self.swapchain.image_views(),
            self.depth_buffer.image_view(),
            extent,
        )?;

        // The image count can change with the surface; per-image
        // resources must track it.
        let image_count = self.swapchain.image_count() as usize;
        if image_count != self.command_buffers.len() {
            let old_handles: Vec<vk::CommandBuffer> =
                self.command_buffers.iter().map(|cb| cb.handle()).collect();
            unsafe {
                self.device
                    .handle()
                    .free_command_buffers(self.command_pool.handle(), &old_handles);
            }
            self.command_buffers = self
                .command_pool
                .allocate_command_buffers(image_count as u32)?
                .into_iter()
                .map(|handle| CommandBuffer::from_handle(self.device.clone(), handle))
                .collect();

            self.render_finished = (0..image_count)
                .map(|_| Semaphore::new(self.device.clone()))
                .collect::<Result<Vec<_>, _>>()?;
        }

        self.swapchain_stale = false;
        info!("Renderer resized to {}x{}", extent.width, extent.height);
        Ok(())
    }

    /// Sets the background clear color used by subsequent frames.
    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = [r, g, b, a];
    }

    /// Whether acquire or present flagged the swapchain as stale since
    /// the last successful resize.
    pub fn needs_recreate(&self) -> bool {
        self.swapchain_stale
    }

    /// Command buffer of the frame currently being recorded, if any.
    pub fn current_command_buffer(&self) -> Option<&CommandBuffer> {
        self.frame_pacer
            .active_image()
            .map(|index| &self.command_buffers[index as usize])
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// Command pool used for one-time upload submissions.
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    pub fn aspect_ratio(&self) -> f32 {
        let extent = self.swapchain.extent();
        extent.width as f32 / extent.height.max(1) as f32
    }

    /// Blocks until the GPU is idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the device wait fails.
    pub fn wait_idle(&self) -> RendererResult<()> {
        self.device.wait_idle().map_err(RendererError::from)
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("Failed to wait for device idle on renderer drop: {e}");
        }

        // Teardown in reverse dependency order. The device outlives all
        // of these through the Arc each wrapper holds; the surface must
        // outlive the swapchain and the instance must outlive the
        // surface.
        self.framebuffers.clear();
        self.command_buffers.clear();
        self.render_finished.clear();
        self.frames.clear();
        unsafe {
            ManuallyDrop::drop(&mut self.depth_buffer);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }
    }
}

/// Builds the render pass clear values: the color attachment cleared to
/// `color` and the depth attachment cleared to the far plane.
fn clear_values(color: [f32; 4]) -> [vk::ClearValue; 2] {
    [
        vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_values_carry_color_and_far_depth() {
        let values = clear_values(CLEAR_COLOR);
        // ClearValue is a union; the first entry is written as a color
        // and the second as depth/stencil.
        unsafe {
            assert_eq!(values[0].color.float32, CLEAR_COLOR);
            assert_eq!(values[1].depth_stencil.depth, 1.0);
            assert_eq!(values[1].depth_stencil.stencil, 0);
        }
    }
}
