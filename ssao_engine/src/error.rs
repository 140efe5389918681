//! Error types for the SSAO engine
//!
//! A single error enum covers device resource creation, presentation,
//! submission and frame sequencing. Helpers classify each variant as
//! recoverable (skip or recreate) or fatal (abort).

use std::fmt;

/// Result type for SSAO engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// SSAO engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Device memory or descriptor-pool allocation failed
    ResourceExhausted(String),

    /// Required image or depth format is not supported by the device
    UnsupportedFormat(String),

    /// Presentable surface no longer matches the window (resize, loss)
    SurfaceOutOfDate,

    /// Bounded wait on a frame fence or image acquisition expired
    FrameTimeout,

    /// Queue submission failed
    SubmitFailed(String),

    /// Logical device was lost
    DeviceLost,

    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Invalid resource (texture, buffer, shader, binding, etc.)
    InvalidResource(String),

    /// Initialization failed (device, swapchain, targets)
    InitializationFailed(String),

    /// Operation attempted in the wrong frame or slot state
    InvalidState(String),
}

impl Error {
    /// Errors the frame loop can absorb by skipping a frame or recreating
    /// size-dependent resources.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SurfaceOutOfDate | Error::FrameTimeout)
    }

    /// Errors that end the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DeviceLost
                | Error::SubmitFailed(_)
                | Error::ResourceExhausted(_)
                | Error::UnsupportedFormat(_)
                | Error::InitializationFailed(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::SurfaceOutOfDate => write!(f, "Surface out of date"),
            Error::FrameTimeout => write!(f, "Timed out waiting for frame"),
            Error::SubmitFailed(msg) => write!(f, "Submit failed: {}", msg),
            Error::DeviceLost => write!(f, "Device lost"),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
