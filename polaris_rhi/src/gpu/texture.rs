/// Texture resource, view descriptors and the per-texture view cache
///
/// Backend view objects are expensive to create, so each texture caches
/// them per view kind, keyed by the clamped subresource range. Two view
/// requests that clamp to the same range return the same view object for
/// the lifetime of the texture.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::gpu::backend::{BackendTexture, GraphicsBackend, TextureView};
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};
use crate::gpu::types::{
    TextureFormat, TextureType, TextureUsage, REMAINING_ARRAY_LAYERS, REMAINING_MIP_LEVELS,
};

/// Descriptor for creating a texture
///
/// Immutable after creation; a texture's contents can only change through
/// explicit recreation.
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    /// Texture dimensionality
    pub texture_type: TextureType,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Depth in pixels (3D textures; 1 otherwise)
    pub depth: u32,
    /// Number of array layers (cubes count in whole cubes, not faces)
    pub array_layers: u32,
    /// Number of mip levels
    pub mip_levels: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage capabilities; determine which view kinds may be requested
    pub usage: TextureUsage,
    /// Sample count (1 = no multisampling)
    pub samples: u32,
}

impl TextureDescriptor {
    /// Descriptor for a basic 2D texture (one layer, one mip, one sample)
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            texture_type: TextureType::D2,
            width,
            height,
            depth: 1,
            array_layers: 1,
            mip_levels: 1,
            format,
            usage,
            samples: 1,
        }
    }
}

/// The kind of interpretation a texture view provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewKind {
    /// Sampled/read access from shaders
    ShaderRead,
    /// Unordered write access from shaders
    ShaderWrite,
    /// Color render target attachment
    RenderTarget,
    /// Depth/stencil attachment
    DepthStencil,
}

impl TextureViewKind {
    fn cache_index(self) -> usize {
        match self {
            TextureViewKind::ShaderRead => 0,
            TextureViewKind::ShaderWrite => 1,
            TextureViewKind::RenderTarget => 2,
            TextureViewKind::DepthStencil => 3,
        }
    }
}

/// Canonical subresource range a view addresses; the view cache key
///
/// Always stored in clamped form: "remaining" sentinels resolved and every
/// field within the owning texture's mip/array extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceViewDesc {
    /// First (most detailed) mip level
    pub base_mip_level: u32,
    /// Number of mip levels
    pub mip_level_count: u32,
    /// First array slice
    pub first_array_slice: u32,
    /// Number of array slices
    pub array_size: u32,
}

/// Backend view dimensionality, resolved from the texture's type, array
/// size and sample count before the backend synthesizes its native view
/// parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDimension {
    Tex1D,
    Tex1DArray,
    Tex2D,
    Tex2DArray,
    Tex2DMultisampled,
    Tex2DMultisampledArray,
    Tex3D,
    Cube,
    CubeArray,
}

/// Resolve the view dimension for a clamped view request
///
/// Render-target, depth-stencil and shader-write views of cube textures
/// address individual faces, so cubes degrade to 2D arrays there (with six
/// slices per cube); only shader-read views keep the cube dimensionality.
pub fn resolve_view_dimension(
    kind: TextureViewKind,
    desc: &TextureDescriptor,
    view: &ResourceViewDesc,
) -> ViewDimension {
    let arrayed = desc.array_layers > 1;
    let multisampled = desc.samples > 1;

    match kind {
        TextureViewKind::ShaderRead => match desc.texture_type {
            TextureType::D1 => {
                if arrayed {
                    ViewDimension::Tex1DArray
                } else {
                    ViewDimension::Tex1D
                }
            }
            TextureType::D2 => match (arrayed, multisampled) {
                (true, true) => ViewDimension::Tex2DMultisampledArray,
                (true, false) => ViewDimension::Tex2DArray,
                (false, true) => ViewDimension::Tex2DMultisampled,
                (false, false) => ViewDimension::Tex2D,
            },
            TextureType::D3 => ViewDimension::Tex3D,
            TextureType::Cube => {
                if view.array_size > 1 {
                    ViewDimension::CubeArray
                } else {
                    ViewDimension::Cube
                }
            }
        },
        TextureViewKind::ShaderWrite => match desc.texture_type {
            TextureType::D1 => {
                if arrayed {
                    ViewDimension::Tex1DArray
                } else {
                    ViewDimension::Tex1D
                }
            }
            TextureType::D2 => {
                if arrayed {
                    ViewDimension::Tex2DArray
                } else {
                    ViewDimension::Tex2D
                }
            }
            TextureType::D3 => ViewDimension::Tex3D,
            TextureType::Cube => ViewDimension::Tex2DArray,
        },
        TextureViewKind::RenderTarget | TextureViewKind::DepthStencil => {
            match desc.texture_type {
                TextureType::D1 => {
                    if arrayed {
                        ViewDimension::Tex1DArray
                    } else {
                        ViewDimension::Tex1D
                    }
                }
                TextureType::D2 | TextureType::Cube => {
                    let face_multiplier = if desc.texture_type == TextureType::Cube {
                        6
                    } else {
                        1
                    };
                    if desc.array_layers * face_multiplier > 1 {
                        if multisampled {
                            ViewDimension::Tex2DMultisampledArray
                        } else {
                            ViewDimension::Tex2DArray
                        }
                    } else if multisampled {
                        ViewDimension::Tex2DMultisampled
                    } else {
                        ViewDimension::Tex2D
                    }
                }
                TextureType::D3 => {
                    if kind == TextureViewKind::RenderTarget {
                        ViewDimension::Tex3D
                    } else {
                        ViewDimension::Tex2DArray
                    }
                }
            }
        }
    }
}

struct TextureState {
    handle: Option<Box<dyn BackendTexture>>,
    views: [FxHashMap<ResourceViewDesc, Arc<dyn TextureView>>; 4],
}

/// A texture created through the device
///
/// Owns the native texture object and one view cache per view kind.
pub struct Texture {
    id: u64,
    desc: TextureDescriptor,
    state: Mutex<TextureState>,
    pub(crate) registration: RegistryBinding,
}

impl Texture {
    pub(crate) fn new(
        desc: TextureDescriptor,
        handle: Box<dyn BackendTexture>,
        registration: RegistryBinding,
    ) -> Self {
        Self {
            id: next_resource_id(),
            desc,
            state: Mutex::new(TextureState {
                handle: Some(handle),
                views: std::array::from_fn(|_| FxHashMap::default()),
            }),
            registration,
        }
    }

    /// The descriptor the texture was created with
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Pixel format
    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    /// Usage capabilities
    pub fn usage(&self) -> TextureUsage {
        self.desc.usage
    }

    /// Number of array layers
    pub fn array_layers(&self) -> u32 {
        self.desc.array_layers
    }

    /// Number of mip levels
    pub fn mip_levels(&self) -> u32 {
        self.desc.mip_levels
    }

    /// Get or lazily create a shader-read view over a mip/slice range
    ///
    /// `mip_level_count` and `array_size` accept the REMAINING_* sentinels.
    pub fn shader_read_view(
        &self,
        base_mip_level: u32,
        mip_level_count: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> Arc<dyn TextureView> {
        debug_assert!(
            self.desc.usage.contains(TextureUsage::SHADER_READ),
            "shader-read view requested on a texture created without SHADER_READ usage"
        );
        self.get_or_create_view(
            TextureViewKind::ShaderRead,
            base_mip_level,
            mip_level_count,
            first_array_slice,
            array_size,
        )
    }

    /// Get or lazily create a shader-write view of a single mip level
    pub fn shader_write_view(
        &self,
        mip_level: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> Arc<dyn TextureView> {
        debug_assert!(
            self.desc.usage.contains(TextureUsage::SHADER_WRITE),
            "shader-write view requested on a texture created without SHADER_WRITE usage"
        );
        self.get_or_create_view(
            TextureViewKind::ShaderWrite,
            mip_level,
            1,
            first_array_slice,
            array_size,
        )
    }

    /// Get or lazily create a render-target view of a single mip level
    pub fn render_target_view(
        &self,
        mip_level: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> Arc<dyn TextureView> {
        debug_assert!(
            self.desc.usage.contains(TextureUsage::RENDER_TARGET)
                && !self.desc.format.is_depth_stencil(),
            "render-target view requires RENDER_TARGET usage and a color format"
        );
        self.get_or_create_view(
            TextureViewKind::RenderTarget,
            mip_level,
            1,
            first_array_slice,
            array_size,
        )
    }

    /// Get or lazily create a depth-stencil view of a single mip level
    pub fn depth_stencil_view(
        &self,
        mip_level: u32,
        first_array_slice: u32,
        array_size: u32,
    ) -> Arc<dyn TextureView> {
        debug_assert!(
            self.desc.usage.contains(TextureUsage::RENDER_TARGET)
                && self.desc.format.is_depth_stencil(),
            "depth-stencil view requires RENDER_TARGET usage and a depth/stencil format"
        );
        self.get_or_create_view(
            TextureViewKind::DepthStencil,
            mip_level,
            1,
            first_array_slice,
            array_size,
        )
    }

    /// Clamp a view request against the texture's extents, then look it up
    /// in the per-kind cache, creating the native view on a miss
    ///
    /// Over-range inputs are normalized down to the last valid mip/slice
    /// rather than rejected. Native view creation failure is unrecoverable
    /// here: by the time a malformed request reaches the native API the
    /// device is either lost or the descriptor logic itself is wrong.
    fn get_or_create_view(
        &self,
        kind: TextureViewKind,
        mut base_mip_level: u32,
        mut mip_level_count: u32,
        mut first_array_slice: u32,
        mut array_size: u32,
    ) -> Arc<dyn TextureView> {
        let layers = self.desc.array_layers;
        let mips = self.desc.mip_levels;

        if first_array_slice >= layers {
            first_array_slice = layers - 1;
        }

        if base_mip_level >= mips {
            base_mip_level = mips - 1;
        }

        if mip_level_count == REMAINING_MIP_LEVELS
            || mip_level_count.saturating_add(base_mip_level) > mips
        {
            mip_level_count = mips - base_mip_level;
        }

        if array_size == REMAINING_ARRAY_LAYERS
            || array_size.saturating_add(first_array_slice) > layers
        {
            array_size = layers - first_array_slice;
        }

        let view_desc = ResourceViewDesc {
            base_mip_level,
            mip_level_count,
            first_array_slice,
            array_size,
        };

        let mut state = self.state.lock().unwrap();
        if let Some(view) = state.views[kind.cache_index()].get(&view_desc) {
            return view.clone();
        }

        let Some(handle) = state.handle.as_deref() else {
            crate::rhi_fatal!(
                "polaris::Texture",
                "view requested on destroyed texture #{}",
                self.id
            );
        };

        let dimension = resolve_view_dimension(kind, &self.desc, &view_desc);
        let view = match handle.create_view(kind, dimension, &view_desc) {
            Ok(view) => view,
            Err(err) => crate::rhi_fatal!(
                "polaris::Texture",
                "native {:?} view creation failed for texture #{}: {}",
                kind,
                self.id,
                err
            ),
        };

        state.views[kind.cache_index()].insert(view_desc, view.clone());
        view
    }

    /// Drop every cached view, for all four view kinds
    ///
    /// Called from destroy/teardown and from device-loss invalidation. Any
    /// outstanding native view handles are released together with the
    /// owning resource.
    pub fn invalidate_views(&self) {
        let mut state = self.state.lock().unwrap();
        for cache in state.views.iter_mut() {
            cache.clear();
        }
    }

    /// Total number of currently cached views across all view kinds
    pub fn cached_view_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.views.iter().map(|cache| cache.len()).sum()
    }
}

impl GpuResource for Texture {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::Texture
    }

    fn resource_id(&self) -> u64 {
        self.id
    }

    fn destroy(&self) {
        let mut state = self.state.lock().unwrap();
        for cache in state.views.iter_mut() {
            cache.clear();
        }
        state.handle = None;
    }

    fn is_destroyed(&self) -> bool {
        self.state.lock().unwrap().handle.is_none()
    }

    fn invalidate(&self) {
        self.destroy();
    }

    fn recreate(&self, backend: &dyn GraphicsBackend) -> Result<()> {
        // Contents are not preserved across a device loss; callers re-upload.
        let new_handle = backend.create_texture(&self.desc, None)?;
        let mut state = self.state.lock().unwrap();
        state.handle = Some(new_handle);
        Ok(())
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.registration.release();
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
