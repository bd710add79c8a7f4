/// Graphics device - resource factory, registry owner and presentation
///
/// The device constructs backend-native objects behind the resource
/// wrappers, keeps a registry of every live resource for bulk teardown in
/// dependency order, and detects device loss at present time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use raw_window_handle::HasWindowHandle;

use crate::error::{Error, Result};
use crate::gpu::backend::{
    DeviceCapabilities, GraphicsBackend, PresentOutcome, SwapchainDescriptor,
};
use crate::gpu::buffer::{BufferDescriptor, GpuBuffer};
use crate::gpu::command_buffer::{CommandBuffer, CommandSinkCell};
use crate::gpu::framebuffer::{build_backend_framebuffer, Framebuffer, FramebufferDescriptor};
use crate::gpu::pipeline::{build_backend_pipeline, RenderPipeline, RenderPipelineDescriptor};
use crate::gpu::resource::{GpuResource, RegistryBinding, ResourceRegistry};
use crate::gpu::sampler::{Sampler, SamplerDescriptor};
use crate::gpu::shader::{Shader, ShaderDescriptor};
use crate::gpu::swapchain::Swapchain;
use crate::gpu::texture::{Texture, TextureDescriptor};
use crate::gpu::types::{ImageLevelData, TextureUsage, MAX_COLOR_ATTACHMENTS};
use crate::{rhi_bail, rhi_debug, rhi_info, rhi_warn};

const SOURCE: &str = "polaris::GraphicsDevice";

/// Low-level graphics device
///
/// Owns the backend capability interface and the device-wide resource
/// registry. Resource creation may be called from any thread; command
/// buffers themselves remain single-owner objects.
pub struct GraphicsDevice {
    backend: Box<dyn GraphicsBackend>,
    registry: Arc<ResourceRegistry>,
    capabilities: DeviceCapabilities,
    /// Bumped on every device-loss recovery; command buffers re-resolve
    /// all tracked state when they observe a new epoch
    epoch: Arc<AtomicU64>,
    swapchain: Mutex<Option<Swapchain>>,
    shut_down: AtomicBool,
}

impl GraphicsDevice {
    /// Create a device over an initialized backend
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Result<Self> {
        let capabilities = backend.capabilities();
        rhi_info!(
            SOURCE,
            "Using {} backend ({}, max color attachments: {})",
            backend.backend_name(),
            capabilities.adapter_name,
            capabilities.max_color_attachments
        );

        Ok(Self {
            backend,
            registry: Arc::new(ResourceRegistry::new()),
            capabilities,
            epoch: Arc::new(AtomicU64::new(0)),
            swapchain: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        })
    }

    /// The adapter's capability set
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Short backend name (e.g. "null", "vulkan")
    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Number of live registered resources
    pub fn resource_count(&self) -> usize {
        self.registry.len()
    }

    /// Current device epoch; bumped on every device-loss recovery
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Register a freshly created resource with the registry
    fn track<R: GpuResource + 'static>(&self, resource: &Arc<R>, binding: &RegistryBinding) {
        let weak: Weak<dyn GpuResource> = Arc::downgrade(resource);
        let key = self.registry.register(resource.resource_type(), weak);
        binding.bind(key);
    }

    /// Create a buffer, optionally uploading initial data
    pub fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Arc<GpuBuffer>> {
        if desc.size == 0 {
            rhi_bail!(SOURCE, "buffer size must be non-zero");
        }
        if desc.usage.is_empty() {
            rhi_bail!(SOURCE, "buffer created without any usage capability");
        }
        if let Some(data) = initial_data {
            if data.len() as u64 > desc.size {
                rhi_bail!(
                    SOURCE,
                    "initial data ({} bytes) exceeds buffer size ({} bytes)",
                    data.len(),
                    desc.size
                );
            }
        }

        let handle = self.backend.create_buffer(desc, initial_data)?;
        let buffer = Arc::new(GpuBuffer::new(
            desc.clone(),
            handle,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&buffer, &buffer.registration);
        Ok(buffer)
    }

    /// Create a texture, optionally uploading initial subresource data
    pub fn create_texture(
        &self,
        desc: &TextureDescriptor,
        initial_data: Option<&[ImageLevelData]>,
    ) -> Result<Arc<Texture>> {
        if desc.width == 0 || desc.height == 0 || desc.depth == 0 {
            rhi_bail!(
                SOURCE,
                "texture extent {}x{}x{} must be non-zero",
                desc.width,
                desc.height,
                desc.depth
            );
        }
        if desc.mip_levels == 0 || desc.array_layers == 0 {
            rhi_bail!(SOURCE, "texture mip and array counts must be non-zero");
        }
        if desc.samples == 0 {
            rhi_bail!(SOURCE, "texture sample count must be non-zero");
        }
        if desc.usage.is_empty() {
            rhi_bail!(SOURCE, "texture created without any usage capability");
        }

        let handle = self.backend.create_texture(desc, initial_data)?;
        let texture = Arc::new(Texture::new(
            desc.clone(),
            handle,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&texture, &texture.registration);
        Ok(texture)
    }

    /// Create an immutable sampler state object
    pub fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<Arc<Sampler>> {
        let handle = self.backend.create_sampler(desc)?;
        let sampler = Arc::new(Sampler::new(
            desc.clone(),
            handle,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&sampler, &sampler.registration);
        Ok(sampler)
    }

    /// Create a shader module from compiled bytecode
    pub fn create_shader(&self, desc: ShaderDescriptor) -> Result<Arc<Shader>> {
        if desc.bytecode.is_empty() {
            rhi_bail!(SOURCE, "shader created with empty bytecode");
        }

        let handle = self.backend.create_shader(&desc)?;
        let shader = Arc::new(Shader::new(
            desc,
            handle,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&shader, &shader.registration);
        Ok(shader)
    }

    /// Create a render pipeline state object
    pub fn create_render_pipeline(
        &self,
        desc: RenderPipelineDescriptor,
    ) -> Result<Arc<RenderPipeline>> {
        if desc.color_formats.len() > self.capabilities.max_color_attachments as usize {
            rhi_bail!(
                SOURCE,
                "pipeline targets {} color attachments, device supports {}",
                desc.color_formats.len(),
                self.capabilities.max_color_attachments
            );
        }
        if desc.sample_count == 0 {
            rhi_bail!(SOURCE, "pipeline sample count must be non-zero");
        }

        let handle = build_backend_pipeline(&desc, self.backend.as_ref())?;
        let pipeline = Arc::new(RenderPipeline::new(
            desc,
            handle,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&pipeline, &pipeline.registration);
        Ok(pipeline)
    }

    /// Create a framebuffer from render target attachments
    ///
    /// Attachment views are resolved through the attached textures' view
    /// caches.
    pub fn create_framebuffer(&self, desc: FramebufferDescriptor) -> Result<Arc<Framebuffer>> {
        let limit =
            MAX_COLOR_ATTACHMENTS.min(self.capabilities.max_color_attachments as usize);
        if desc.color_attachments.len() > limit {
            rhi_bail!(
                SOURCE,
                "framebuffer has {} color attachments, device supports {}",
                desc.color_attachments.len(),
                limit
            );
        }
        if desc.color_attachments.is_empty() && desc.depth_stencil_attachment.is_none() {
            rhi_bail!(SOURCE, "framebuffer needs at least one attachment");
        }
        for (index, attachment) in desc.color_attachments.iter().enumerate() {
            let texture = &attachment.texture;
            if !texture.usage().contains(TextureUsage::RENDER_TARGET)
                || texture.format().is_depth_stencil()
            {
                rhi_bail!(
                    SOURCE,
                    "color attachment {} requires RENDER_TARGET usage and a color format",
                    index
                );
            }
        }
        if let Some(attachment) = &desc.depth_stencil_attachment {
            let texture = &attachment.texture;
            if !texture.usage().contains(TextureUsage::RENDER_TARGET)
                || !texture.format().is_depth_stencil()
            {
                rhi_bail!(
                    SOURCE,
                    "depth attachment requires RENDER_TARGET usage and a depth/stencil format"
                );
            }
        }

        let handle = build_backend_framebuffer(&desc, self.backend.as_ref())?;
        let framebuffer = Arc::new(Framebuffer::new(
            desc,
            handle,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&framebuffer, &framebuffer.registration);
        Ok(framebuffer)
    }

    /// Create a command buffer
    pub fn create_command_buffer(&self) -> Result<CommandBuffer> {
        let sink = self.backend.create_command_sink()?;
        let cell = Arc::new(CommandSinkCell::new(
            sink,
            RegistryBinding::new(&self.registry),
        ));
        self.track(&cell, &cell.registration);
        Ok(CommandBuffer::new(cell, self.epoch.clone()))
    }

    /// Create the device's swapchain
    ///
    /// `window` is an opaque window-system handle; pass None for headless
    /// presentation.
    pub fn create_swapchain(
        &self,
        desc: SwapchainDescriptor,
        window: Option<&dyn HasWindowHandle>,
    ) -> Result<()> {
        if desc.width == 0 || desc.height == 0 {
            rhi_bail!(SOURCE, "swapchain extent must be non-zero");
        }

        let backend_swapchain = self.backend.create_swapchain(&desc, window)?;
        let mut swapchain = self.swapchain.lock().unwrap();
        *swapchain = Some(Swapchain::new(desc, backend_swapchain));
        Ok(())
    }

    /// Whether a swapchain has been created
    pub fn has_swapchain(&self) -> bool {
        self.swapchain.lock().unwrap().is_some()
    }

    /// Run `f` with the swapchain, if one exists
    pub fn with_swapchain<R>(&self, f: impl FnOnce(&Swapchain) -> R) -> Option<R> {
        let swapchain = self.swapchain.lock().unwrap();
        swapchain.as_ref().map(f)
    }

    /// Resize the swapchain backbuffers
    pub fn resize_swapchain(&self, width: u32, height: u32) -> Result<()> {
        let mut swapchain = self.swapchain.lock().unwrap();
        match swapchain.as_mut() {
            Some(swapchain) => swapchain.resize(width, height),
            None => rhi_bail!(SOURCE, "resize_swapchain without a swapchain"),
        }
    }

    /// Read back the current backbuffer contents
    pub fn capture_backbuffer(&self) -> Result<Vec<u8>> {
        let swapchain = self.swapchain.lock().unwrap();
        match swapchain.as_ref() {
            Some(swapchain) => swapchain.read_backbuffer(),
            None => rhi_bail!(SOURCE, "capture_backbuffer without a swapchain"),
        }
    }

    /// Present the current frame
    ///
    /// Inspects the backend's present outcome; a reported device loss
    /// triggers full recovery before returning.
    pub fn present(&self) -> Result<()> {
        let outcome = {
            let mut swapchain = self.swapchain.lock().unwrap();
            match swapchain.as_mut() {
                Some(swapchain) => swapchain.present(),
                None => rhi_bail!(SOURCE, "present without a swapchain"),
            }
        };

        match outcome {
            PresentOutcome::Presented => Ok(()),
            PresentOutcome::Suboptimal => {
                rhi_debug!(SOURCE, "present reported a suboptimal swapchain");
                Ok(())
            }
            PresentOutcome::DeviceLost => self.handle_device_loss(),
        }
    }

    /// Recover from a device loss
    ///
    /// Bumps the device epoch (live command buffers re-resolve all tracked
    /// state on their next draw), drops every native handle in
    /// dependents-first order, re-establishes the backend device, then
    /// recreates every resource in dependencies-first order and rebuilds
    /// the swapchain. Buffer and texture contents are not preserved;
    /// callers re-upload.
    pub fn handle_device_loss(&self) -> Result<()> {
        rhi_warn!(SOURCE, "device loss detected, recreating device objects");
        self.epoch.fetch_add(1, Ordering::AcqRel);

        // live_resources() sorts dependents first (teardown order).
        let live = self.registry.live_resources();
        for resource in &live {
            resource.invalidate();
        }

        self.backend
            .recover()
            .map_err(|err| Error::DeviceLost(format!("backend recovery failed: {}", err)))?;

        for resource in live.iter().rev() {
            resource.recreate(self.backend.as_ref()).map_err(|err| {
                Error::DeviceLost(format!(
                    "failed to recreate {:?} #{}: {}",
                    resource.resource_type(),
                    resource.resource_id(),
                    err
                ))
            })?;
        }

        {
            let mut swapchain = self.swapchain.lock().unwrap();
            if let Some(swapchain) = swapchain.as_mut() {
                swapchain
                    .recreate(self.backend.as_ref())
                    .map_err(|err| Error::DeviceLost(format!("swapchain recreation failed: {}", err)))?;
            }
        }

        rhi_info!(
            SOURCE,
            "device recovery complete, {} resources recreated",
            live.len()
        );
        Ok(())
    }

    /// Wait for all GPU operations to complete
    pub fn wait_idle(&self) -> Result<()> {
        self.backend.wait_idle()
    }

    /// Destroy the swapchain and every registered resource
    ///
    /// Resources are destroyed sorted by resource type so that dependent
    /// kinds are torn down before the resources they reference. Idempotent;
    /// also invoked from Drop.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            let mut swapchain = self.swapchain.lock().unwrap();
            *swapchain = None;
        }

        let destroyed = self.registry.teardown();
        rhi_debug!(SOURCE, "device shutdown, {} resources destroyed", destroyed);
    }
}

impl Drop for GraphicsDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "graphics_device_tests.rs"]
mod tests;
