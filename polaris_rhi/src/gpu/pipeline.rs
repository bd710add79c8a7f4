/// Render pipeline resource and descriptor

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::gpu::backend::{BackendPipeline, GraphicsBackend};
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};
use crate::gpu::shader::Shader;
use crate::gpu::types::{PrimitiveTopology, TextureFormat, VertexFormat};

/// One vertex attribute consumed by the vertex shader
///
/// Attribute offsets and formats are static pipeline state; the stride and
/// input rate of the buffer feeding an attribute come from the command
/// buffer's vertex bindings at draw time.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Attribute data format
    pub format: VertexFormat,
    /// Vertex buffer binding index the attribute reads from
    pub buffer_binding: u32,
    /// Byte offset of the attribute within one element
    pub offset: u32,
}

/// Descriptor for creating a render pipeline
#[derive(Clone)]
pub struct RenderPipelineDescriptor {
    /// Vertex stage shader module
    pub vertex_shader: Arc<Shader>,
    /// Optional fragment stage shader module
    pub fragment_shader: Option<Arc<Shader>>,
    /// Primitive topology the pipeline is built for; draws requesting a
    /// different topology are structurally incompatible and are skipped
    pub topology: PrimitiveTopology,
    /// Vertex attribute layout
    pub vertex_attributes: Vec<VertexAttribute>,
    /// Formats of the color attachments the pipeline renders into
    pub color_formats: Vec<TextureFormat>,
    /// Format of the depth/stencil attachment, if any
    pub depth_format: Option<TextureFormat>,
    /// Sample count of the attachments
    pub sample_count: u32,
}

/// A render pipeline state object created through the device
pub struct RenderPipeline {
    id: u64,
    desc: RenderPipelineDescriptor,
    pub(crate) handle: Mutex<Option<Box<dyn BackendPipeline>>>,
    pub(crate) registration: RegistryBinding,
}

impl RenderPipeline {
    pub(crate) fn new(
        desc: RenderPipelineDescriptor,
        handle: Box<dyn BackendPipeline>,
        registration: RegistryBinding,
    ) -> Self {
        Self {
            id: next_resource_id(),
            desc,
            handle: Mutex::new(Some(handle)),
            registration,
        }
    }

    /// The descriptor the pipeline was created with
    pub fn descriptor(&self) -> &RenderPipelineDescriptor {
        &self.desc
    }

    /// The topology the pipeline was built for
    pub fn topology(&self) -> PrimitiveTopology {
        self.desc.topology
    }

    /// Run `f` with the native pipeline object, if the pipeline is still live
    pub(crate) fn with_handle<R>(&self, f: impl FnOnce(&dyn BackendPipeline) -> R) -> Option<R> {
        let handle = self.handle.lock().unwrap();
        handle.as_deref().map(f)
    }
}

/// Resolve the descriptor's shader handles and build the native pipeline
pub(crate) fn build_backend_pipeline(
    desc: &RenderPipelineDescriptor,
    backend: &dyn GraphicsBackend,
) -> Result<Box<dyn BackendPipeline>> {
    let vertex_guard = desc.vertex_shader.handle.lock().unwrap();
    let Some(vertex) = vertex_guard.as_deref() else {
        return Err(Error::InvalidResource(
            "pipeline references a destroyed vertex shader".to_string(),
        ));
    };

    let fragment_guard = desc
        .fragment_shader
        .as_ref()
        .map(|shader| shader.handle.lock().unwrap());
    let fragment = match &fragment_guard {
        Some(guard) => match guard.as_deref() {
            Some(shader) => Some(shader),
            None => {
                return Err(Error::InvalidResource(
                    "pipeline references a destroyed fragment shader".to_string(),
                ));
            }
        },
        None => None,
    };

    backend.create_pipeline(desc, vertex, fragment)
}

impl GpuResource for RenderPipeline {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::Pipeline
    }

    fn resource_id(&self) -> u64 {
        self.id
    }

    fn destroy(&self) {
        let mut handle = self.handle.lock().unwrap();
        *handle = None;
    }

    fn is_destroyed(&self) -> bool {
        self.handle.lock().unwrap().is_none()
    }

    fn invalidate(&self) {
        self.destroy();
    }

    fn recreate(&self, backend: &dyn GraphicsBackend) -> Result<()> {
        // Shaders sort after pipelines in teardown order, so they have
        // already been recreated when the recovery walk reaches this point.
        let new_handle = build_backend_pipeline(&self.desc, backend)?;
        let mut handle = self.handle.lock().unwrap();
        *handle = Some(new_handle);
        Ok(())
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.registration.release();
    }
}
