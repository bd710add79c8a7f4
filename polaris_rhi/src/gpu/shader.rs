/// Shader module resource and descriptor

use std::sync::Mutex;

use crate::error::Result;
use crate::gpu::backend::{BackendShader, GraphicsBackend};
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/Pixel shader
    Fragment,
    /// Compute shader
    Compute,
}

/// Descriptor for creating a shader module
///
/// The bytecode is owned so the module can be recreated after a device
/// loss. Source-language compilation happens upstream; this layer only
/// consumes compiled bytecode.
#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    /// Shader stage
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: String,
    /// Compiled shader bytecode (SPIR-V or DXBC)
    pub bytecode: Vec<u8>,
}

/// A shader module created through the device
pub struct Shader {
    id: u64,
    desc: ShaderDescriptor,
    pub(crate) handle: Mutex<Option<Box<dyn BackendShader>>>,
    pub(crate) registration: RegistryBinding,
}

impl Shader {
    pub(crate) fn new(
        desc: ShaderDescriptor,
        handle: Box<dyn BackendShader>,
        registration: RegistryBinding,
    ) -> Self {
        Self {
            id: next_resource_id(),
            desc,
            handle: Mutex::new(Some(handle)),
            registration,
        }
    }

    /// Shader stage
    pub fn stage(&self) -> ShaderStage {
        self.desc.stage
    }

    /// Entry point function name
    pub fn entry_point(&self) -> &str {
        &self.desc.entry_point
    }
}

impl GpuResource for Shader {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::Shader
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
        let new_handle = backend.create_shader(&self.desc)?;
        let mut handle = self.handle.lock().unwrap();
        *handle = Some(new_handle);
        Ok(())
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.registration.release();
    }
}
