/*!
# Polaris RHI

Core traits and types for the Polaris rendering hardware interface.

This crate provides a backend-agnostic API for creating GPU resources
(buffers, textures, shaders, render pipelines, framebuffers, command
buffers) using trait-based dynamic polymorphism. Backend implementations
(null/software, Vulkan-style, Direct3D-style) implement the adapter
contract in [`gpu::backend`] and are selected when building the graphics
context.

## Architecture

- **GraphicsContext**: top-level object selecting a backend, owning the
  device and the cross-thread deferred command queue
- **GraphicsDevice**: resource factory and registry owner; detects device
  loss at present time and drives recovery
- **CommandBuffer**: dirty-state tracker resolving bound-state deltas into
  backend calls immediately before each draw
- **Texture**: owns per-view-kind caches of lazily created backend views

Backend crates provide concrete types that implement the traits in
[`gpu::backend`].
*/

// Internal modules
mod context;
mod error;
pub mod log;
pub mod gpu;

// Main polaris namespace module
pub mod polaris {
    // Error types
    pub use crate::error::{Error, Result};

    // Context facade
    pub use crate::context::{
        BackendKind, ContextConfig, DeferredCommand, GraphicsContext, GraphicsContextBuilder,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{
            reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger,
        };
        // Note: rhi_* macros are NOT re-exported here - they are internal only
    }

    // GPU sub-module with all device and resource types
    pub mod gpu {
        pub use crate::gpu::*;
    }
}

// Re-export math library at crate root
pub use glam;
