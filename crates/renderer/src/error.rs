//! Renderer error types.

use thiserror::Error;

use meshview_rhi::RhiError;

/// Errors from frame orchestration and renderer setup.
#[derive(Error, Debug)]
pub enum RendererError {
    /// GPU-level failures from the RHI layer.
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// Window or surface failures from the platform layer.
    #[error(transparent)]
    Platform(#[from] meshview_core::Error),
}

/// Result type alias for renderer operations.
pub type RendererResult<T> = std::result::Result<T, RendererError>;
