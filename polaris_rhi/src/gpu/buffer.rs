/// GPU buffer resource and descriptor

use std::sync::Mutex;

use crate::error::Result;
use crate::gpu::backend::{BackendBuffer, GraphicsBackend};
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};
use crate::gpu::types::BufferUsage;
use crate::rhi_bail;

/// Descriptor for creating a buffer
///
/// The descriptor is immutable after creation; the only mutation a buffer
/// supports afterwards is sub-region data upload.
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// Total size in bytes
    pub size: u64,
    /// Usage capabilities
    pub usage: BufferUsage,
    /// Byte size of one element; used as the vertex stride when the buffer
    /// is bound as a vertex buffer
    pub element_size: u64,
}

/// A GPU buffer created through the device
///
/// Holds the native buffer object behind the backend adapter contract.
/// Binding slots reference buffers weakly: keeping a buffer alive while it
/// is bound is the caller's responsibility.
pub struct GpuBuffer {
    id: u64,
    desc: BufferDescriptor,
    pub(crate) handle: Mutex<Option<Box<dyn BackendBuffer>>>,
    pub(crate) registration: RegistryBinding,
}

impl GpuBuffer {
    pub(crate) fn new(
        desc: BufferDescriptor,
        handle: Box<dyn BackendBuffer>,
        registration: RegistryBinding,
    ) -> Self {
        Self {
            id: next_resource_id(),
            desc,
            handle: Mutex::new(Some(handle)),
            registration,
        }
    }

    /// The descriptor the buffer was created with
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.desc
    }

    /// Total size in bytes
    pub fn size(&self) -> u64 {
        self.desc.size
    }

    /// Usage capabilities
    pub fn usage(&self) -> BufferUsage {
        self.desc.usage
    }

    /// Byte size of one element (vertex stride)
    pub fn element_size(&self) -> u64 {
        self.desc.element_size
    }

    /// Upload data into a sub-region of the buffer
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write; `offset + data.len()` must fit in the buffer
    pub fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.desc.size {
            rhi_bail!(
                "polaris::GpuBuffer",
                "update out of range: offset {} + {} bytes exceeds buffer size {}",
                offset,
                data.len(),
                self.desc.size
            );
        }

        let handle = self.handle.lock().unwrap();
        match handle.as_deref() {
            Some(buffer) => buffer.upload(offset, data),
            None => rhi_bail!(
                "polaris::GpuBuffer",
                "update on destroyed buffer #{}",
                self.id
            ),
        }
    }

    /// Run `f` with the native buffer object, if the buffer is still live
    pub(crate) fn with_handle<R>(&self, f: impl FnOnce(&dyn BackendBuffer) -> R) -> Option<R> {
        let handle = self.handle.lock().unwrap();
        handle.as_deref().map(f)
    }
}

impl GpuResource for GpuBuffer {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::Buffer
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
        // Contents are not preserved across a device loss; callers re-upload.
        let new_handle = backend.create_buffer(&self.desc, None)?;
        let mut handle = self.handle.lock().unwrap();
        *handle = Some(new_handle);
        Ok(())
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.registration.release();
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
