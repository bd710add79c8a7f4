/// Framebuffer resource - groups render target attachments for drawing
///
/// A framebuffer binds together color and depth/stencil attachments. Its
/// attachment views are resolved through the owning textures' view caches,
/// so two framebuffers targeting the same texture subrange share one native
/// view object.

use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::gpu::backend::{BackendFramebuffer, GraphicsBackend, TextureView};
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};
use crate::gpu::texture::Texture;

/// One framebuffer attachment: a texture subrange to render into
#[derive(Clone)]
pub struct FramebufferAttachment {
    /// The texture to attach (kept strongly: the framebuffer depends on it)
    pub texture: Arc<Texture>,
    /// Mip level to render into
    pub mip_level: u32,
    /// First array slice to render into
    pub first_array_slice: u32,
    /// Number of array slices
    pub array_size: u32,
}

impl FramebufferAttachment {
    /// Attachment addressing a texture's base mip, first slice
    pub fn base(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            mip_level: 0,
            first_array_slice: 0,
            array_size: 1,
        }
    }
}

/// Descriptor for creating a framebuffer
#[derive(Clone)]
pub struct FramebufferDescriptor {
    /// Color attachments, at most the device's color attachment limit
    pub color_attachments: Vec<FramebufferAttachment>,
    /// Optional depth/stencil attachment
    pub depth_stencil_attachment: Option<FramebufferAttachment>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// A framebuffer created through the device
pub struct Framebuffer {
    id: u64,
    desc: FramebufferDescriptor,
    pub(crate) handle: Mutex<Option<Box<dyn BackendFramebuffer>>>,
    pub(crate) registration: RegistryBinding,
}

impl Framebuffer {
    pub(crate) fn new(
        desc: FramebufferDescriptor,
        handle: Box<dyn BackendFramebuffer>,
        registration: RegistryBinding,
    ) -> Self {
        Self {
            id: next_resource_id(),
            desc,
            handle: Mutex::new(Some(handle)),
            registration,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Number of color attachments
    pub fn color_attachment_count(&self) -> usize {
        self.desc.color_attachments.len()
    }

    /// Run `f` with the native framebuffer object, if still live
    pub(crate) fn with_handle<R>(
        &self,
        f: impl FnOnce(&dyn BackendFramebuffer) -> R,
    ) -> Option<R> {
        let handle = self.handle.lock().unwrap();
        handle.as_deref().map(f)
    }
}

/// Resolve the descriptor's attachment views and build the native framebuffer
pub(crate) fn build_backend_framebuffer(
    desc: &FramebufferDescriptor,
    backend: &dyn GraphicsBackend,
) -> Result<Box<dyn BackendFramebuffer>> {
    let color_views: Vec<Arc<dyn TextureView>> = desc
        .color_attachments
        .iter()
        .map(|attachment| {
            attachment.texture.render_target_view(
                attachment.mip_level,
                attachment.first_array_slice,
                attachment.array_size,
            )
        })
        .collect();

    let depth_stencil_view = desc.depth_stencil_attachment.as_ref().map(|attachment| {
        attachment.texture.depth_stencil_view(
            attachment.mip_level,
            attachment.first_array_slice,
            attachment.array_size,
        )
    });

    backend.create_framebuffer(
        &color_views,
        depth_stencil_view.as_ref(),
        desc.width,
        desc.height,
    )
}

impl GpuResource for Framebuffer {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::Framebuffer
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
        // Textures sort after framebuffers in teardown order, so the
        // recovery walk has already recreated them and their view caches
        // repopulate here with views on the new device.
        let new_handle = build_backend_framebuffer(&self.desc, backend)?;
        let mut handle = self.handle.lock().unwrap();
        *handle = Some(new_handle);
        Ok(())
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        self.registration.release();
    }
}
