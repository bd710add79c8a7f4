/// Null resource objects - simulated native handles with event recording

use std::sync::{Arc, Mutex};

use polaris_rhi::polaris::gpu::{
    BackendBuffer, BackendFramebuffer, BackendPipeline, BackendSampler, BackendShader,
    BackendTexture, ResourceViewDesc, ShaderStage, TextureDescriptor, TextureView,
    TextureViewKind, ViewDimension,
};
use polaris_rhi::polaris::{Error, Result};

use crate::null_backend::NullShared;

// ============================================================================
// Buffer
// ============================================================================

/// Simulated buffer backed by host memory
pub struct NullBuffer {
    id: u64,
    shared: Arc<NullShared>,
    storage: Mutex<Vec<u8>>,
}

impl NullBuffer {
    pub(crate) fn new(shared: Arc<NullShared>, size: u64) -> Self {
        let id = shared.next_id();
        shared.push(format!("create:buffer#{}", id));
        Self {
            id,
            shared,
            storage: Mutex::new(vec![0u8; size as usize]),
        }
    }

    /// The buffer's current contents (the backing host memory)
    pub fn contents(&self) -> Vec<u8> {
        self.storage.lock().unwrap().clone()
    }
}

impl BackendBuffer for NullBuffer {
    fn upload(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut storage = self.storage.lock().unwrap();
        let offset = offset as usize;
        if offset + data.len() > storage.len() {
            return Err(Error::BackendError(format!(
                "upload past the end of buffer #{}",
                self.id
            )));
        }
        storage[offset..offset + data.len()].copy_from_slice(data);
        self.shared
            .push(format!("upload:buffer#{}:{}+{}", self.id, offset, data.len()));
        Ok(())
    }

    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for NullBuffer {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:buffer#{}", self.id));
    }
}

// ============================================================================
// Texture and texture views
// ============================================================================

/// Simulated texture; creates recorded view objects on demand
pub struct NullTexture {
    id: u64,
    shared: Arc<NullShared>,
    desc: TextureDescriptor,
}

impl NullTexture {
    pub(crate) fn new(shared: Arc<NullShared>, desc: TextureDescriptor) -> Self {
        let id = shared.next_id();
        shared.push(format!(
            "create:texture#{} ({}x{}, {} mips, {} layers)",
            id, desc.width, desc.height, desc.mip_levels, desc.array_layers
        ));
        Self { id, shared, desc }
    }
}

impl BackendTexture for NullTexture {
    fn create_view(
        &self,
        kind: TextureViewKind,
        dimension: ViewDimension,
        desc: &ResourceViewDesc,
    ) -> Result<Arc<dyn TextureView>> {
        // The core layer hands over clamped ranges; a range escaping the
        // texture here would be a descriptor-logic bug, which a native API
        // would reject at view creation.
        if desc.base_mip_level + desc.mip_level_count > self.desc.mip_levels
            || desc.first_array_slice + desc.array_size > self.desc.array_layers
        {
            return Err(Error::BackendError(format!(
                "view range escapes texture #{}",
                self.id
            )));
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
        Ok(Arc::new(NullTextureView {
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

impl Drop for NullTexture {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:texture#{}", self.id));
    }
}

/// Simulated texture view
pub struct NullTextureView {
    id: u64,
    kind: TextureViewKind,
    desc: ResourceViewDesc,
    shared: Arc<NullShared>,
}

impl TextureView for NullTextureView {
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

impl Drop for NullTextureView {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:view#{}", self.id));
    }
}

// ============================================================================
// Sampler, shader, pipeline, framebuffer
// ============================================================================

/// Simulated sampler state
pub struct NullSampler {
    id: u64,
    shared: Arc<NullShared>,
}

impl NullSampler {
    pub(crate) fn new(shared: Arc<NullShared>) -> Self {
        let id = shared.next_id();
        shared.push(format!("create:sampler#{}", id));
        Self { id, shared }
    }
}

impl BackendSampler for NullSampler {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for NullSampler {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:sampler#{}", self.id));
    }
}

/// Simulated shader module
pub struct NullShader {
    id: u64,
    stage: ShaderStage,
    shared: Arc<NullShared>,
}

impl NullShader {
    pub(crate) fn new(shared: Arc<NullShared>, stage: ShaderStage) -> Self {
        let id = shared.next_id();
        shared.push(format!("create:shader#{} ({:?})", id, stage));
        Self { id, stage, shared }
    }

    /// The stage the module was created for
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl BackendShader for NullShader {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for NullShader {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:shader#{}", self.id));
    }
}

/// Simulated render pipeline state object
pub struct NullPipeline {
    id: u64,
    shared: Arc<NullShared>,
}

impl NullPipeline {
    pub(crate) fn new(shared: Arc<NullShared>) -> Self {
        let id = shared.next_id();
        shared.push(format!("create:pipeline#{}", id));
        Self { id, shared }
    }
}

impl BackendPipeline for NullPipeline {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for NullPipeline {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:pipeline#{}", self.id));
    }
}

/// Simulated framebuffer
pub struct NullFramebuffer {
    id: u64,
    shared: Arc<NullShared>,
}

impl NullFramebuffer {
    pub(crate) fn new(
        shared: Arc<NullShared>,
        color_count: u32,
        has_depth: bool,
        width: u32,
        height: u32,
    ) -> Self {
        let id = shared.next_id();
        shared.push(format!(
            "create:framebuffer#{} ({}x{}, colors: {}, depth: {})",
            id, width, height, color_count, has_depth
        ));
        Self { id, shared }
    }
}

impl BackendFramebuffer for NullFramebuffer {
    fn native_id(&self) -> u64 {
        self.id
    }
}

impl Drop for NullFramebuffer {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:framebuffer#{}", self.id));
    }
}
