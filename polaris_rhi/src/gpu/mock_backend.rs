/// Mock backend for unit tests (no GPU required)
///
/// Records every backend call into a shared event list so tests can assert
/// exactly which native calls the dirty-state resolution and the view
/// caches produced, and in which order. Creation failures and device loss
/// can be injected through shared flags.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use raw_window_handle::HasWindowHandle;

use crate::error::{Error, Result};
use crate::gpu::backend::{
    BackendBuffer, BackendFramebuffer, BackendPipeline, BackendSampler, BackendShader,
    BackendSwapchain, BackendTexture, CommandSink, DeviceCapabilities, GpuVendor,
    GraphicsBackend, PresentOutcome, SwapchainDescriptor, TextureView, VertexLayoutEntry,
};
use crate::gpu::buffer::BufferDescriptor;
use crate::gpu::pipeline::RenderPipelineDescriptor;
use crate::gpu::sampler::SamplerDescriptor;
use crate::gpu::shader::ShaderDescriptor;
use crate::gpu::texture::{ResourceViewDesc, TextureDescriptor, TextureViewKind, ViewDimension};
use crate::gpu::types::{
    ImageLevelData, IndexType, PrimitiveTopology, Rect2D, TextureFormat, Viewport,
};

// ============================================================================
// Shared instrumentation
// ============================================================================

/// Shared state observed by tests
pub struct MockShared {
    next_id: AtomicU64,
    events: Mutex<Vec<String>>,
    /// When set, the next create_buffer call fails
    pub fail_buffer_creation: AtomicBool,
    /// When set, every create_view call fails
    pub fail_view_creation: AtomicBool,
    /// When set, the next present reports device loss (and clears the flag)
    pub lose_next_present: AtomicBool,
}

impl MockShared {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            events: Mutex::new(Vec::new()),
            fail_buffer_creation: AtomicBool::new(false),
            fail_view_creation: AtomicBool::new(false),
            lose_next_present: AtomicBool::new(false),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    /// All recorded events, in order
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Only command-sink events (prefix "cmd:"), in order
    pub fn commands(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.starts_with("cmd:"))
            .collect()
    }

    /// Number of recorded events starting with `prefix`
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .count()
    }

    /// Forget all recorded events
    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Mock backend that records calls without touching any GPU
pub struct MockBackend {
    shared: Arc<MockShared>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(MockShared::new()),
        }
    }

    /// Shared instrumentation handle for assertions
    pub fn shared(&self) -> Arc<MockShared> {
        self.shared.clone()
    }
}

impl GraphicsBackend for MockBackend {
    fn backend_name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            adapter_name: "Mock Adapter".to_string(),
            vendor: GpuVendor::Software,
            max_color_attachments: 8,
            multithreaded_resource_creation: true,
        }
    }

    fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        _initial_data: Option<&[u8]>,
    ) -> Result<Box<dyn BackendBuffer>> {
        if self.shared.fail_buffer_creation.load(Ordering::Relaxed) {
            return Err(Error::BackendError("injected buffer creation failure".to_string()));
        }
        let id = self.shared.next_id();
        self.shared.push(format!("create:buffer#{}", id));
        Ok(Box::new(MockBuffer {
            id,
            size: desc.size,
            shared: self.shared.clone(),
        }))
    }

    fn create_texture(
        &self,
        _desc: &TextureDescriptor,
        _initial_data: Option<&[ImageLevelData]>,
    ) -> Result<Box<dyn BackendTexture>> {
        let id = self.shared.next_id();
        self.shared.push(format!("create:texture#{}", id));
        Ok(Box::new(MockTexture {
            id,
            shared: self.shared.clone(),
        }))
    }

    fn create_sampler(&self, _desc: &SamplerDescriptor) -> Result<Box<dyn BackendSampler>> {
        let id = self.shared.next_id();
        self.shared.push(format!("create:sampler#{}", id));
        Ok(Box::new(MockSampler {
            id,
            shared: self.shared.clone(),
        }))
    }

    fn create_shader(&self, _desc: &ShaderDescriptor) -> Result<Box<dyn BackendShader>> {
        let id = self.shared.next_id();
        self.shared.push(format!("create:shader#{}", id));
        Ok(Box::new(MockShader {
            id,
            shared: self.shared.clone(),
        }))
    }

    fn create_pipeline(
        &self,
        _desc: &RenderPipelineDescriptor,
        _vertex_shader: &dyn BackendShader,
        _fragment_shader: Option<&dyn BackendShader>,
    ) -> Result<Box<dyn BackendPipeline>> {
        let id = self.shared.next_id();
        self.shared.push(format!("create:pipeline#{}", id));
        Ok(Box::new(MockPipeline {
            id,
            shared: self.shared.clone(),
        }))
    }

    fn create_framebuffer(
        &self,
        color_views: &[Arc<dyn TextureView>],
        depth_stencil_view: Option<&Arc<dyn TextureView>>,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn BackendFramebuffer>> {
        let id = self.shared.next_id();
        self.shared.push(format!(
            "create:framebuffer#{} (colors: {}, depth: {})",
            id,
            color_views.len(),
            depth_stencil_view.is_some()
        ));
        Ok(Box::new(MockFramebuffer {
            id,
            shared: self.shared.clone(),
        }))
    }

    fn create_command_sink(&self) -> Result<Box<dyn CommandSink>> {
        let id = self.shared.next_id();
        self.shared.push(format!("create:command_sink#{}", id));
        Ok(Box::new(MockCommandSink {
            id,
            shared: self.shared.clone(),
        }))
    }

    fn create_swapchain(
        &self,
        desc: &SwapchainDescriptor,
        _window: Option<&dyn HasWindowHandle>,
    ) -> Result<Box<dyn BackendSwapchain>> {
        let id = self.shared.next_id();
        self.shared.push(format!("create:swapchain#{}", id));
        Ok(Box::new(MockSwapchain {
            id,
            width: desc.width,
            height: desc.height,
            shared: self.shared.clone(),
        }))
    }

    fn recover(&self) -> Result<()> {
        self.shared.push("recover".to_string());
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Mock resources
// ============================================================================

struct MockBuffer {
    id: u64,
    size: u64,
    shared: Arc<MockShared>,
}

impl BackendBuffer for MockBuffer {
    fn upload(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::BackendError("upload out of range".to_string()));
        }
        self.shared
            .push(format!("upload:buffer#{}:{}+{}", self.id, offset, data.len()));
        Ok(())
    }

    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:buffer#{}", self.id));
    }
}

struct MockTexture {
    id: u64,
    shared: Arc<MockShared>,
}

impl BackendTexture for MockTexture {
    fn create_view(
        &self,
        kind: TextureViewKind,
        dimension: ViewDimension,
        desc: &ResourceViewDesc,
    ) -> Result<Arc<dyn TextureView>> {
        if self.shared.fail_view_creation.load(Ordering::Relaxed) {
            return Err(Error::BackendError("injected view creation failure".to_string()));
        }
        let id = self.shared.next_id();
        self.shared.push(format!(
            "create_view:{:?}:{:?}:{}:{}:{}:{}",
            kind,
            dimension,
            desc.base_mip_level,
            desc.mip_level_count,
            desc.first_array_slice,
            desc.array_size
        ));
        Ok(Arc::new(MockTextureView {
            id,
            kind,
            desc: *desc,
            shared: self.shared.clone(),
        }))
    }

    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:texture#{}", self.id));
    }
}

struct MockTextureView {
    id: u64,
    kind: TextureViewKind,
    desc: ResourceViewDesc,
    shared: Arc<MockShared>,
}

impl TextureView for MockTextureView {
    fn kind(&self) -> TextureViewKind {
        self.kind
    }

    fn descriptor(&self) -> ResourceViewDesc {
        self.desc
    }

    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockTextureView {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:view#{}", self.id));
    }
}

struct MockSampler {
    id: u64,
    shared: Arc<MockShared>,
}

impl BackendSampler for MockSampler {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockSampler {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:sampler#{}", self.id));
    }
}

struct MockShader {
    id: u64,
    shared: Arc<MockShared>,
}

impl BackendShader for MockShader {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockShader {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:shader#{}", self.id));
    }
}

struct MockPipeline {
    id: u64,
    shared: Arc<MockShared>,
}

impl BackendPipeline for MockPipeline {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:pipeline#{}", self.id));
    }
}

struct MockFramebuffer {
    id: u64,
    shared: Arc<MockShared>,
}

impl BackendFramebuffer for MockFramebuffer {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:framebuffer#{}", self.id));
    }
}

// ============================================================================
// Mock command sink
// ============================================================================

struct MockCommandSink {
    id: u64,
    shared: Arc<MockShared>,
}

impl MockCommandSink {
    fn record(&self, command: String) {
        self.shared.push(format!("cmd:{}", command));
    }
}

impl CommandSink for MockCommandSink {
    fn begin(&mut self) {
        self.record("begin".to_string());
    }

    fn finish(&mut self) {
        self.record("finish".to_string());
    }

    fn reset(&mut self) {
        self.record("reset".to_string());
    }

    fn begin_render_pass(
        &mut self,
        framebuffer: &dyn BackendFramebuffer,
        _clear_colors: &[[f32; 4]],
        _clear_depth: f32,
        _clear_stencil: u8,
    ) {
        self.record(format!("begin_render_pass:fb#{}", framebuffer.native_id()));
    }

    fn end_render_pass(&mut self) {
        self.record("end_render_pass".to_string());
    }

    fn set_viewport(&mut self, _viewport: Viewport) {
        self.record("set_viewport".to_string());
    }

    fn set_scissor(&mut self, _scissor: Rect2D) {
        self.record("set_scissor".to_string());
    }

    fn set_render_pipeline(&mut self, pipeline: &dyn BackendPipeline) {
        self.record(format!("set_render_pipeline:#{}", pipeline.native_id()));
    }

    fn set_vertex_layout(&mut self, layout: &[VertexLayoutEntry]) {
        self.record(format!("set_vertex_layout:{}", layout.len()));
    }

    fn set_vertex_buffer(&mut self, binding: u32, buffer: &dyn BackendBuffer, offset: u64) {
        self.record(format!(
            "set_vertex_buffer:{}:#{}:{}",
            binding,
            buffer.native_id(),
            offset
        ));
    }

    fn set_index_buffer(&mut self, buffer: &dyn BackendBuffer, offset: u64, index_type: IndexType) {
        self.record(format!(
            "set_index_buffer:#{}:{}:{:?}",
            buffer.native_id(),
            offset,
            index_type
        ));
    }

    fn bind_uniform_buffer(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &dyn BackendBuffer,
        offset: u64,
        range: u64,
    ) {
        self.record(format!(
            "bind_uniform_buffer:{}:{}:#{}:{}:{}",
            set,
            slot,
            buffer.native_id(),
            offset,
            range
        ));
    }

    fn bind_storage_buffer(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &dyn BackendBuffer,
        offset: u64,
        range: u64,
    ) {
        self.record(format!(
            "bind_storage_buffer:{}:{}:#{}:{}:{}",
            set,
            slot,
            buffer.native_id(),
            offset,
            range
        ));
    }

    fn bind_texture_view(&mut self, set: u32, slot: u32, view: &dyn TextureView) {
        self.record(format!("bind_texture_view:{}:{}:#{}", set, slot, view.native_id()));
    }

    fn bind_sampler(&mut self, set: u32, slot: u32, sampler: &dyn BackendSampler) {
        self.record(format!("bind_sampler:{}:{}:#{}", set, slot, sampler.native_id()));
    }

    fn draw(
        &mut self,
        _topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        _first_vertex: u32,
        _first_instance: u32,
    ) {
        self.record(format!("draw:{}:{}", vertex_count, instance_count));
    }

    fn draw_indexed(
        &mut self,
        _topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        _first_index: u32,
    ) {
        self.record(format!("draw_indexed:{}:{}", index_count, instance_count));
    }
}

impl Drop for MockCommandSink {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:command_sink#{}", self.id));
    }
}

// ============================================================================
// Mock swapchain
// ============================================================================

struct MockSwapchain {
    id: u64,
    width: u32,
    height: u32,
    shared: Arc<MockShared>,
}

impl BackendSwapchain for MockSwapchain {
    fn present(&mut self) -> PresentOutcome {
        if self.shared.lose_next_present.swap(false, Ordering::AcqRel) {
            self.shared.push("present:device_lost".to_string());
            return PresentOutcome::DeviceLost;
        }
        self.shared.push("present".to_string());
        PresentOutcome::Presented
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn read_backbuffer(&self) -> Result<Vec<u8>> {
        let bytes = self.width as usize
            * self.height as usize
            * TextureFormat::B8G8R8A8_UNORM.bytes_per_pixel() as usize;
        Ok(vec![0u8; bytes])
    }
}

impl Drop for MockSwapchain {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:swapchain#{}", self.id));
    }
}
