/// Sampler resource and descriptor

use std::sync::Mutex;

use crate::error::Result;
use crate::gpu::backend::{BackendSampler, GraphicsBackend};
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};

/// Texel filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Texture coordinate addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    MirrorRepeat,
    ClampToEdge,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone)]
pub struct SamplerDescriptor {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mip_filter: FilterMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mip_filter: FilterMode::Linear,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
        }
    }
}

/// An immutable sampler state object created through the device
pub struct Sampler {
    id: u64,
    desc: SamplerDescriptor,
    pub(crate) handle: Mutex<Option<Box<dyn BackendSampler>>>,
    pub(crate) registration: RegistryBinding,
}

impl Sampler {
    pub(crate) fn new(
        desc: SamplerDescriptor,
        handle: Box<dyn BackendSampler>,
        registration: RegistryBinding,
    ) -> Self {
        Self {
            id: next_resource_id(),
            desc,
            handle: Mutex::new(Some(handle)),
            registration,
        }
    }

    /// The descriptor the sampler was created with
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.desc
    }

    /// Run `f` with the native sampler object, if the sampler is still live
    pub(crate) fn with_handle<R>(&self, f: impl FnOnce(&dyn BackendSampler) -> R) -> Option<R> {
        let handle = self.handle.lock().unwrap();
        handle.as_deref().map(f)
    }
}

impl GpuResource for Sampler {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::Sampler
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
        let new_handle = backend.create_sampler(&self.desc)?;
        let mut handle = self.handle.lock().unwrap();
        *handle = Some(new_handle);
        Ok(())
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.registration.release();
    }
}
