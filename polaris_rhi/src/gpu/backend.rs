/// Backend adapter contract - the trait surface a native backend implements
///
/// The device and command buffer hold a `dyn GraphicsBackend` capability
/// interface rather than inheriting from a backend base type. One
/// implementation exists per native API (null/software, Vulkan-style,
/// Direct3D-style); the null backend ships in `polaris_rhi_backend_null`.

use std::sync::Arc;
use raw_window_handle::HasWindowHandle;

use crate::error::Result;
use crate::gpu::types::{
    ImageLevelData, IndexType, PrimitiveTopology, Rect2D, TextureFormat, VertexInputRate,
    Viewport,
};
use crate::gpu::buffer::BufferDescriptor;
use crate::gpu::pipeline::RenderPipelineDescriptor;
use crate::gpu::sampler::SamplerDescriptor;
use crate::gpu::shader::ShaderDescriptor;
use crate::gpu::texture::{ResourceViewDesc, TextureDescriptor, TextureViewKind, ViewDimension};

// ============================================================================
// Capability discovery
// ============================================================================

/// GPU vendor reported by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuVendor {
    Unknown,
    Arm,
    Nvidia,
    Amd,
    Intel,
    /// Software rasterizer / reference adapter
    Software,
}

/// Device capability flags reported by a backend at initialization
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Human-readable adapter name
    pub adapter_name: String,
    /// Adapter vendor
    pub vendor: GpuVendor,
    /// Maximum number of simultaneous color attachments
    pub max_color_attachments: u32,
    /// Whether the backend supports resource creation from multiple threads
    pub multithreaded_resource_creation: bool,
}

// ============================================================================
// Presentation
// ============================================================================

/// Result of a swapchain present call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The frame was presented
    Presented,
    /// The frame was presented but the swapchain no longer matches the
    /// surface (e.g. after a resize) and should be recreated
    Suboptimal,
    /// The native device was removed or reset; all device objects must be
    /// recreated before rendering can resume
    DeviceLost,
}

/// Descriptor for creating a swapchain
#[derive(Debug, Clone)]
pub struct SwapchainDescriptor {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Backbuffer pixel format
    pub format: TextureFormat,
    /// Number of backbuffer images
    pub image_count: u32,
    /// Whether presentation waits for vertical sync
    pub vsync: bool,
}

impl Default for SwapchainDescriptor {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: TextureFormat::B8G8R8A8_UNORM,
            image_count: 3,
            vsync: true,
        }
    }
}

// ============================================================================
// Backend device
// ============================================================================

/// Backend device contract
///
/// The central factory interface a native backend implements. All objects
/// it returns are owned by the resource wrappers in this crate; dropping a
/// returned object releases the native object.
pub trait GraphicsBackend: Send + Sync {
    /// Short backend name (e.g. "null", "vulkan")
    fn backend_name(&self) -> &str;

    /// Report the adapter's capability set
    fn capabilities(&self) -> DeviceCapabilities;

    /// Create a native buffer, optionally uploading initial data
    fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<Box<dyn BackendBuffer>>;

    /// Create a native texture, optionally uploading initial subresource data
    fn create_texture(
        &self,
        desc: &TextureDescriptor,
        initial_data: Option<&[ImageLevelData]>,
    ) -> Result<Box<dyn BackendTexture>>;

    /// Create a native sampler state object
    fn create_sampler(&self, desc: &SamplerDescriptor) -> Result<Box<dyn BackendSampler>>;

    /// Create a native shader module from the descriptor's bytecode
    fn create_shader(&self, desc: &ShaderDescriptor) -> Result<Box<dyn BackendShader>>;

    /// Create a native render pipeline from the descriptor and the already
    /// created shader modules it references
    fn create_pipeline(
        &self,
        desc: &RenderPipelineDescriptor,
        vertex_shader: &dyn BackendShader,
        fragment_shader: Option<&dyn BackendShader>,
    ) -> Result<Box<dyn BackendPipeline>>;

    /// Create a native framebuffer from resolved attachment views
    fn create_framebuffer(
        &self,
        color_views: &[Arc<dyn TextureView>],
        depth_stencil_view: Option<&Arc<dyn TextureView>>,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn BackendFramebuffer>>;

    /// Create a native command-generation sink for one command buffer
    fn create_command_sink(&self) -> Result<Box<dyn CommandSink>>;

    /// Create a swapchain for the given surface
    ///
    /// `window` is an opaque window-system handle; headless backends ignore
    /// it and present into an offscreen backbuffer.
    fn create_swapchain(
        &self,
        desc: &SwapchainDescriptor,
        window: Option<&dyn HasWindowHandle>,
    ) -> Result<Box<dyn BackendSwapchain>>;

    /// Re-establish the native device after a device loss
    ///
    /// Called by the device's recovery path before any resource is
    /// recreated. All previously created backend objects are already
    /// dropped at this point.
    fn recover(&self) -> Result<()>;

    /// Wait for all GPU operations to complete
    fn wait_idle(&self) -> Result<()>;
}

// ============================================================================
// Backend resource objects
// ============================================================================

/// Native buffer object
pub trait BackendBuffer: Send + Sync {
    /// Upload data into a sub-region of the buffer
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    fn upload(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Backend-assigned identity, stable for the object's lifetime.
    /// Used for diagnostics and command-stream recording.
    fn native_id(&self) -> u64;
}

/// Native texture object
pub trait BackendTexture: Send + Sync {
    /// Create a native view over a subresource range of this texture
    ///
    /// `desc` is already clamped against the texture's mip/array extents and
    /// `dimension` is already resolved from the texture's type, array size
    /// and sample count; the backend only synthesizes its native view
    /// parameters from them.
    fn create_view(
        &self,
        kind: TextureViewKind,
        dimension: ViewDimension,
        desc: &ResourceViewDesc,
    ) -> Result<Arc<dyn TextureView>>;

    /// Backend-assigned identity, stable for the object's lifetime
    fn native_id(&self) -> u64;
}

/// Native texture view object (shader-read, shader-write, render-target or
/// depth-stencil interpretation of a texture subrange)
pub trait TextureView: Send + Sync {
    /// The view kind this view was created for
    fn kind(&self) -> TextureViewKind;

    /// The clamped subresource range this view addresses
    fn descriptor(&self) -> ResourceViewDesc;

    /// Backend-assigned identity, stable for the object's lifetime
    fn native_id(&self) -> u64;
}

/// Native sampler state object
pub trait BackendSampler: Send + Sync {
    /// Backend-assigned identity, stable for the object's lifetime
    fn native_id(&self) -> u64;
}

/// Native shader module
pub trait BackendShader: Send + Sync {
    /// Backend-assigned identity, stable for the object's lifetime
    fn native_id(&self) -> u64;
}

/// Native render pipeline state object
pub trait BackendPipeline: Send + Sync {
    /// Backend-assigned identity, stable for the object's lifetime
    fn native_id(&self) -> u64;
}

/// Native framebuffer object
pub trait BackendFramebuffer: Send + Sync {
    /// Backend-assigned identity, stable for the object's lifetime
    fn native_id(&self) -> u64;
}

/// Native swapchain object
pub trait BackendSwapchain: Send {
    /// Present the current backbuffer and report the outcome
    fn present(&mut self) -> PresentOutcome;

    /// Resize the backbuffers
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Read back the current backbuffer contents (tightly packed pixels)
    fn read_backbuffer(&self) -> Result<Vec<u8>>;
}

// ============================================================================
// Command generation
// ============================================================================

/// One vertex buffer binding's contribution to the pipeline input layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayoutEntry {
    /// Vertex buffer binding index
    pub binding: u32,
    /// Byte stride between consecutive elements
    pub stride: u64,
    /// Per-vertex or per-instance stepping
    pub input_rate: VertexInputRate,
}

/// Native command-generation sink
///
/// The command buffer's draw-resolution step pushes only state that its
/// dirty tracking found stale; every call on this trait therefore maps to
/// exactly one native state-setting or draw call. Calls are infallible:
/// native command recording APIs do not report per-call errors, failures
/// surface later at submit/present time.
pub trait CommandSink: Send {
    /// Begin recording a new stretch of commands
    fn begin(&mut self);

    /// Finish recording
    fn finish(&mut self);

    /// Discard all recorded state
    fn reset(&mut self);

    /// Begin a render pass targeting the given framebuffer
    fn begin_render_pass(
        &mut self,
        framebuffer: &dyn BackendFramebuffer,
        clear_colors: &[[f32; 4]],
        clear_depth: f32,
        clear_stencil: u8,
    );

    /// End the current render pass
    fn end_render_pass(&mut self);

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D);

    /// Bind a render pipeline state object
    fn set_render_pipeline(&mut self, pipeline: &dyn BackendPipeline);

    /// Apply the static vertex input layout (strides and input rates)
    fn set_vertex_layout(&mut self, layout: &[VertexLayoutEntry]);

    /// Bind one vertex buffer slot
    fn set_vertex_buffer(&mut self, binding: u32, buffer: &dyn BackendBuffer, offset: u64);

    /// Bind the index buffer
    fn set_index_buffer(&mut self, buffer: &dyn BackendBuffer, offset: u64, index_type: IndexType);

    /// Bind a uniform buffer range into a descriptor set slot
    fn bind_uniform_buffer(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &dyn BackendBuffer,
        offset: u64,
        range: u64,
    );

    /// Bind a storage buffer range into a descriptor set slot
    fn bind_storage_buffer(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &dyn BackendBuffer,
        offset: u64,
        range: u64,
    );

    /// Bind a shader-read texture view into a descriptor set slot
    fn bind_texture_view(&mut self, set: u32, slot: u32, view: &dyn TextureView);

    /// Bind a sampler into a descriptor set slot
    fn bind_sampler(&mut self, set: u32, slot: u32, sampler: &dyn BackendSampler);

    /// Issue a non-indexed draw
    fn draw(
        &mut self,
        topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    /// Issue an indexed draw
    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    );
}
