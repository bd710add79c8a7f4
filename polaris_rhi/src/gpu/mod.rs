/// GPU module - resource model, backend contract, device and command buffer

// Module declarations
pub mod types;
pub mod backend;
pub mod resource;
pub mod buffer;
pub mod texture;
pub mod sampler;
pub mod shader;
pub mod pipeline;
pub mod framebuffer;
pub mod swapchain;
pub mod command_buffer;
pub mod graphics_device;

// Re-export everything
pub use types::*;
pub use backend::*;
pub use resource::*;
pub use buffer::*;
pub use texture::*;
pub use sampler::*;
pub use shader::*;
pub use pipeline::*;
pub use framebuffer::*;
pub use swapchain::*;
pub use command_buffer::*;
pub use graphics_device::*;

// Mock backend for unit tests (no GPU required)
#[cfg(test)]
pub mod mock_backend;
