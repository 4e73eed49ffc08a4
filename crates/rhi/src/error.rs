//! RHI-specific error types.
//!
//! All variants here are fatal per the viewer's error policy: creation
//! failures propagate to the top-level loop, never retried. The one
//! recoverable surface condition (out-of-date swapchain on acquire or
//! present) is reported as a value by `Swapchain`, not through this enum.

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading or validation error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface creation error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// Buffer creation or write error
    #[error("Buffer error: {0}")]
    BufferError(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_failures_convert_to_allocator_errors() {
        let err = RhiError::from(gpu_allocator::AllocationError::OutOfMemory);
        assert!(matches!(err, RhiError::AllocatorError(_)));
        assert!(err.to_string().starts_with("Allocator error"));
    }
}
