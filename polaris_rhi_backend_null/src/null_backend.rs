/// NullBackend - headless implementation of the backend adapter contract

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use raw_window_handle::HasWindowHandle;

use polaris_rhi::polaris::gpu::{
    BackendBuffer, BackendFramebuffer, BackendPipeline, BackendSampler, BackendShader,
    BackendSwapchain, BackendTexture, BufferDescriptor, CommandSink, DeviceCapabilities,
    GpuVendor, GraphicsBackend, ImageLevelData, RenderPipelineDescriptor, SamplerDescriptor,
    ShaderDescriptor, SwapchainDescriptor, TextureDescriptor, TextureView,
    MAX_COLOR_ATTACHMENTS,
};
use polaris_rhi::polaris::Result;

use crate::null_command_sink::NullCommandSink;
use crate::null_resources::{
    NullBuffer, NullFramebuffer, NullPipeline, NullSampler, NullShader, NullTexture,
};
use crate::null_swapchain::NullSwapchain;

/// State shared between the backend, its objects and the controller
pub(crate) struct NullShared {
    next_id: AtomicU64,
    device_generation: AtomicU64,
    pub(crate) lose_next_present: AtomicBool,
    events: Mutex<Vec<String>>,
}

impl NullShared {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            device_generation: AtomicU64::new(0),
            lose_next_present: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// Headless software/null backend
///
/// Implements the full adapter contract without touching any GPU. Useful
/// as the fallback backend, for CI, and for tools that need resource and
/// command bookkeeping without presentation hardware.
pub struct NullBackend {
    shared: Arc<NullShared>,
}

impl NullBackend {
    /// Create a null backend
    pub fn new() -> Self {
        Self {
            shared: Arc::new(NullShared::new()),
        }
    }

    /// Create a null backend together with its test/diagnostics controller
    pub fn with_controller() -> (Self, NullBackendController) {
        let backend = Self::new();
        let controller = NullBackendController {
            shared: backend.shared.clone(),
        };
        (backend, controller)
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Introspection and fault-injection handle for a NullBackend
///
/// Lives independently of the backend (the device owns the backend; tests
/// keep the controller).
pub struct NullBackendController {
    shared: Arc<NullShared>,
}

impl NullBackendController {
    /// Every recorded event, in order: object creation/destruction,
    /// command-sink commands (prefix "cmd:"), presents and recoveries
    pub fn events(&self) -> Vec<String> {
        self.shared.events()
    }

    /// Only command-sink events, in order
    pub fn commands(&self) -> Vec<String> {
        self.shared
            .events()
            .into_iter()
            .filter(|event| event.starts_with("cmd:"))
            .collect()
    }

    /// Number of recorded events starting with `prefix`
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.shared
            .events()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .count()
    }

    /// Forget all recorded events
    pub fn clear_events(&self) {
        self.shared.events.lock().unwrap().clear();
    }

    /// Make the next present report device loss
    pub fn inject_device_loss(&self) {
        self.shared.lose_next_present.store(true, Ordering::Release);
    }

    /// Number of times the simulated device was recreated
    pub fn device_generation(&self) -> u64 {
        self.shared.device_generation.load(Ordering::Acquire)
    }
}

impl GraphicsBackend for NullBackend {
    fn backend_name(&self) -> &str {
        "null"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            adapter_name: "Polaris Null Adapter".to_string(),
            vendor: GpuVendor::Software,
            max_color_attachments: MAX_COLOR_ATTACHMENTS as u32,
            multithreaded_resource_creation: true,
        }
    }

    fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Box<dyn BackendBuffer>> {
        let buffer = NullBuffer::new(self.shared.clone(), desc.size);
        if let Some(data) = initial_data {
            buffer.upload(0, data)?;
        }
        Ok(Box::new(buffer))
    }

    fn create_texture(
        &self,
        desc: &TextureDescriptor,
        _initial_data: Option<&[ImageLevelData]>,
    ) -> Result<Box<dyn BackendTexture>> {
        Ok(Box::new(NullTexture::new(self.shared.clone(), desc.clone())))
    }

    fn create_sampler(&self, _desc: &SamplerDescriptor) -> Result<Box<dyn BackendSampler>> {
        Ok(Box::new(NullSampler::new(self.shared.clone())))
    }

    fn create_shader(&self, desc: &ShaderDescriptor) -> Result<Box<dyn BackendShader>> {
        Ok(Box::new(NullShader::new(self.shared.clone(), desc.stage)))
    }

    fn create_pipeline(
        &self,
        _desc: &RenderPipelineDescriptor,
        _vertex_shader: &dyn BackendShader,
        _fragment_shader: Option<&dyn BackendShader>,
    ) -> Result<Box<dyn BackendPipeline>> {
        Ok(Box::new(NullPipeline::new(self.shared.clone())))
    }

    fn create_framebuffer(
        &self,
        color_views: &[Arc<dyn TextureView>],
        depth_stencil_view: Option<&Arc<dyn TextureView>>,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn BackendFramebuffer>> {
        Ok(Box::new(NullFramebuffer::new(
            self.shared.clone(),
            color_views.len() as u32,
            depth_stencil_view.is_some(),
            width,
            height,
        )))
    }

    fn create_command_sink(&self) -> Result<Box<dyn CommandSink>> {
        Ok(Box::new(NullCommandSink::new(self.shared.clone())))
    }

    fn create_swapchain(
        &self,
        desc: &SwapchainDescriptor,
        _window: Option<&dyn HasWindowHandle>,
    ) -> Result<Box<dyn BackendSwapchain>> {
        Ok(Box::new(NullSwapchain::new(self.shared.clone(), desc.clone())))
    }

    fn recover(&self) -> Result<()> {
        self.shared.device_generation.fetch_add(1, Ordering::AcqRel);
        self.shared.push("recover".to_string());
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}
