/// Common GPU types: formats, usage flags, binding limits and sentinels

use bitflags::bitflags;

// ===== BINDING LIMITS =====

/// Maximum number of simultaneously bound vertex buffers
pub const MAX_VERTEX_BUFFER_BINDINGS: usize = 4;

/// Maximum number of descriptor sets visible to a pipeline
pub const MAX_DESCRIPTOR_SETS: usize = 4;

/// Maximum number of bindings within a single descriptor set
pub const MAX_BINDINGS_PER_SET: usize = 16;

/// Maximum number of color attachments on a framebuffer
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

// ===== "REMAINING" SENTINELS =====

/// Sentinel for "all mip levels from the base level to the last one"
pub const REMAINING_MIP_LEVELS: u32 = u32::MAX;

/// Sentinel for "all array layers from the first slice to the last one"
pub const REMAINING_ARRAY_LAYERS: u32 = u32::MAX;

// ===== FORMATS =====

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_FLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Returns size in bytes of a single pixel in this format
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB => 4,
            TextureFormat::R16G16B16A16_FLOAT => 8,
            TextureFormat::D16_UNORM => 2,
            TextureFormat::D32_FLOAT => 4,
            TextureFormat::D24_UNORM_S8_UINT => 4,
        }
    }

    /// Returns true for depth and combined depth/stencil formats
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
        )
    }
}

/// Vertex attribute data format
///
/// Defines the data type and component count for vertex buffer elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum VertexFormat {
    // Float formats
    R32_SFLOAT,          // float (4 bytes)
    R32G32_SFLOAT,       // vec2 (8 bytes)
    R32G32B32_SFLOAT,    // vec3 (12 bytes)
    R32G32B32A32_SFLOAT, // vec4 (16 bytes)

    // Integer formats
    R32_UINT,
    R32G32B32A32_UINT,

    // Byte formats
    R8G8B8A8_UNORM,
}

impl VertexFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexFormat::R32_SFLOAT | VertexFormat::R32_UINT => 4,
            VertexFormat::R32G32_SFLOAT => 8,
            VertexFormat::R32G32B32_SFLOAT => 12,
            VertexFormat::R32G32B32A32_SFLOAT | VertexFormat::R32G32B32A32_UINT => 16,
            VertexFormat::R8G8B8A8_UNORM => 4,
        }
    }
}

// ===== USAGE FLAGS =====

bitflags! {
    /// Buffer usage capabilities, fixed at creation time
    ///
    /// A binding call is only legal for a buffer created with the matching
    /// usage bit (e.g. `set_vertex_buffer` requires `VERTEX`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufferUsage: u32 {
        /// Buffer can be bound as a vertex buffer
        const VERTEX = 1 << 0;
        /// Buffer can be bound as an index buffer
        const INDEX = 1 << 1;
        /// Buffer can be bound as a uniform/constant buffer
        const UNIFORM = 1 << 2;
        /// Buffer can be bound as a storage buffer
        const STORAGE = 1 << 3;
    }
}

bitflags! {
    /// Texture usage capabilities, fixed at creation time
    ///
    /// Usage flags determine which view kinds may legally be requested
    /// from the texture's view caches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureUsage: u32 {
        /// Texture can be sampled/read in shaders (shader-read views)
        const SHADER_READ = 1 << 0;
        /// Texture can be written from shaders (shader-write views)
        const SHADER_WRITE = 1 << 1;
        /// Texture can be used as a render target attachment.
        /// Depth/stencil formats with this flag produce depth-stencil views.
        const RENDER_TARGET = 1 << 2;
    }
}

// ===== GEOMETRY AND DRAW TYPES =====

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureType {
    /// One-dimensional texture
    D1,
    /// Two-dimensional texture
    D2,
    /// Three-dimensional (volume) texture
    D3,
    /// Cube texture (six 2D faces per cube)
    Cube,
}

/// Index element type for indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Returns size in bytes of a single index
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Rate at which a vertex buffer is stepped during a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInputRate {
    /// Advance once per vertex
    Vertex,
    /// Advance once per instance
    Instance,
}

/// Primitive assembly topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

// ===== UPLOAD AND PASS TYPES =====

/// A single mip level of initial texture data
///
/// One entry per (array layer, mip level) pair, layers-major, matching the
/// subresource ordering used by texture creation.
#[derive(Debug, Clone, Copy)]
pub struct ImageLevelData<'a> {
    /// Raw pixel bytes for this level
    pub data: &'a [u8],
    /// Bytes per row; 0 derives the pitch from the level's width and format
    pub row_pitch: u32,
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
