/*!
# Polaris RHI - Null Backend

Headless software/null implementation of the Polaris backend adapter
contract.

Every native object is simulated: resources are handle objects with
stable identities, the command sink records the generated command stream,
and the swapchain presents into an offscreen backbuffer. A controller
handle exposes creation counters, the recorded event stream and
device-loss injection, which makes this backend the reference environment
for integration tests and headless tools.
*/

// Null implementation modules
mod null_backend;
mod null_command_sink;
mod null_resources;
mod null_swapchain;

pub use null_backend::{NullBackend, NullBackendController};

use polaris_rhi::polaris::{BackendKind, GraphicsContextBuilder};

/// Register the null backend on a context builder
///
/// # Example
///
/// ```
/// use polaris_rhi::polaris::{ContextConfig, GraphicsContextBuilder};
///
/// let context = polaris_rhi_backend_null::register(
///     GraphicsContextBuilder::new(ContextConfig::default()),
/// )
/// .build()
/// .unwrap();
/// ```
pub fn register(builder: GraphicsContextBuilder) -> GraphicsContextBuilder {
    builder.register_backend(BackendKind::Null, |_config| Ok(Box::new(NullBackend::new())))
}
