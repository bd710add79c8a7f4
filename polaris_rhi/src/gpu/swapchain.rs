/// Swapchain wrapper - presentation surface owned by the device

use crate::error::Result;
use crate::gpu::backend::{
    BackendSwapchain, GraphicsBackend, PresentOutcome, SwapchainDescriptor,
};
use crate::gpu::types::TextureFormat;

/// The device's presentation surface
///
/// Owned directly by the device rather than the resource registry: it is
/// destroyed first at shutdown, before any registered resource.
pub struct Swapchain {
    desc: SwapchainDescriptor,
    backend: Box<dyn BackendSwapchain>,
}

impl Swapchain {
    pub(crate) fn new(desc: SwapchainDescriptor, backend: Box<dyn BackendSwapchain>) -> Self {
        Self { desc, backend }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Backbuffer pixel format
    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    /// The descriptor the swapchain was created with
    pub fn descriptor(&self) -> &SwapchainDescriptor {
        &self.desc
    }

    /// Present the current backbuffer; the outcome is inspected by the
    /// device for device-loss detection
    pub(crate) fn present(&mut self) -> PresentOutcome {
        self.backend.present()
    }

    /// Resize the backbuffers (e.g. after a window resize)
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.backend.resize(width, height)?;
        self.desc.width = width;
        self.desc.height = height;
        Ok(())
    }

    /// Read back the current backbuffer contents (tightly packed pixels)
    pub fn read_backbuffer(&self) -> Result<Vec<u8>> {
        self.backend.read_backbuffer()
    }

    /// Rebuild the native swapchain on a recovered device
    pub(crate) fn recreate(&mut self, backend: &dyn GraphicsBackend) -> Result<()> {
        self.backend = backend.create_swapchain(&self.desc, None)?;
        Ok(())
    }
}
