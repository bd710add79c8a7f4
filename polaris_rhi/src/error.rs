//! Error types for the Polaris rendering hardware interface
//!
//! This module defines the error types used throughout the crate,
//! including backend, initialization and resource lifecycle failures.

use std::fmt;

/// Result type for Polaris RHI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Polaris RHI errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, DirectX, null, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, shader, etc.) or invalid usage of one
    InvalidResource(String),

    /// Initialization failed (context, device, backend selection)
    InitializationFailed(String),

    /// The device was lost and could not be recovered
    DeviceLost(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and return it from the enclosing function
///
/// # Example
///
/// ```ignore
/// if desc.size == 0 {
///     rhi_bail!("polaris::GraphicsDevice", "buffer size must be non-zero");
/// }
/// ```
#[macro_export]
macro_rules! rhi_bail {
    ($source:expr, $($arg:tt)*) => {{
        $crate::rhi_error!($source, $($arg)*);
        return Err($crate::polaris::Error::InvalidResource(format!($($arg)*)));
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
