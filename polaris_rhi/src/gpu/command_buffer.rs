/// Command buffer - bound-state tracking and draw-time delta resolution
///
/// The command buffer remembers the currently bound rendering state and
/// pushes only the categories that changed since the last draw to the
/// backend, immediately before each draw call. Categories are resolved in
/// a fixed order: pipeline, then vertex layout/buffers, then descriptor
/// sets, then the index buffer.
///
/// A command buffer is owned by a single thread; it is not a thread-safe
/// object. The only shared piece is the native sink, which the device must
/// reach during teardown and device-loss recovery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use bitflags::bitflags;

use crate::error::Result;
use crate::gpu::backend::{CommandSink, GraphicsBackend, VertexLayoutEntry};
use crate::gpu::buffer::GpuBuffer;
use crate::gpu::framebuffer::Framebuffer;
use crate::gpu::pipeline::RenderPipeline;
use crate::gpu::resource::{next_resource_id, GpuResource, GpuResourceType, RegistryBinding};
use crate::gpu::sampler::Sampler;
use crate::gpu::texture::Texture;
use crate::gpu::types::{
    BufferUsage, IndexType, PrimitiveTopology, Rect2D, TextureUsage, VertexInputRate, Viewport,
    MAX_BINDINGS_PER_SET, MAX_DESCRIPTOR_SETS, MAX_VERTEX_BUFFER_BINDINGS,
    REMAINING_ARRAY_LAYERS, REMAINING_MIP_LEVELS,
};
use crate::rhi_warn;

const SOURCE: &str = "polaris::CommandBuffer";

bitflags! {
    /// Coarse dirty-state categories
    ///
    /// A category's bit is set exactly when the backend-visible state for
    /// that category is stale relative to the last resolved snapshot.
    /// Per-vertex-buffer-slot and per-descriptor-set dirtiness are tracked
    /// in separate bitmasks alongside these flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        /// A stride or input-rate change requires re-deriving the backend
        /// input layout, not just rebinding buffers
        const STATIC_VERTEX = 1 << 0;
        /// The bound pipeline changed
        const PIPELINE = 1 << 1;
        /// The index buffer binding changed
        const INDEX_BUFFER = 1 << 2;
    }
}

/// One vertex buffer binding slot
///
/// The buffer reference is weak: binding never extends a resource's
/// lifetime. The id doubles as the "bound" marker (0 = empty) and as the
/// identity compared by the dirty check.
struct VertexSlot {
    buffer: Weak<GpuBuffer>,
    buffer_id: u64,
    offset: u64,
    stride: u64,
    input_rate: VertexInputRate,
}

impl VertexSlot {
    fn empty() -> Self {
        Self {
            buffer: Weak::new(),
            buffer_id: 0,
            offset: 0,
            stride: 0,
            input_rate: VertexInputRate::Vertex,
        }
    }
}

/// How a buffer is bound within a descriptor set slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferBindKind {
    Uniform,
    Storage,
}

/// One descriptor set binding slot
enum BindingSlot {
    Empty,
    Buffer {
        buffer: Weak<GpuBuffer>,
        buffer_id: u64,
        offset: u64,
        range: u64,
        kind: BufferBindKind,
    },
    Texture {
        texture: Weak<Texture>,
        texture_id: u64,
    },
    Sampler {
        sampler: Weak<Sampler>,
        sampler_id: u64,
    },
}

/// The index buffer binding slot
struct IndexSlot {
    buffer: Weak<GpuBuffer>,
    buffer_id: u64,
    offset: u64,
    index_type: IndexType,
}

impl IndexSlot {
    fn empty() -> Self {
        Self {
            buffer: Weak::new(),
            buffer_id: 0,
            offset: 0,
            index_type: IndexType::U16,
        }
    }
}

/// The shareable part of a command buffer: its native sink
///
/// Registered with the device registry so teardown can release the native
/// object first (command buffers sort before every other resource kind)
/// and device-loss recovery can rebuild it.
pub(crate) struct CommandSinkCell {
    id: u64,
    pub(crate) sink: Mutex<Option<Box<dyn CommandSink>>>,
    pub(crate) registration: RegistryBinding,
}

impl CommandSinkCell {
    pub(crate) fn new(sink: Box<dyn CommandSink>, registration: RegistryBinding) -> Self {
        Self {
            id: next_resource_id(),
            sink: Mutex::new(Some(sink)),
            registration,
        }
    }
}

impl GpuResource for CommandSinkCell {
    fn resource_type(&self) -> GpuResourceType {
        GpuResourceType::CommandBuffer
    }

    fn resource_id(&self) -> u64 {
        self.id
    }

    fn destroy(&self) {
        let mut sink = self.sink.lock().unwrap();
        *sink = None;
    }

    fn is_destroyed(&self) -> bool {
        self.sink.lock().unwrap().is_none()
    }

    fn invalidate(&self) {
        self.destroy();
    }

    fn recreate(&self, backend: &dyn GraphicsBackend) -> Result<()> {
        let new_sink = backend.create_command_sink()?;
        let mut sink = self.sink.lock().unwrap();
        *sink = Some(new_sink);
        Ok(())
    }
}

impl Drop for CommandSinkCell {
    fn drop(&mut self) {
        self.registration.release();
    }
}

/// A command buffer created through the device
pub struct CommandBuffer {
    cell: Arc<CommandSinkCell>,
    device_epoch: Arc<AtomicU64>,
    seen_epoch: u64,
    dirty: DirtyFlags,
    dirty_sets: u32,
    dirty_vbos: u32,
    vertex_slots: [VertexSlot; MAX_VERTEX_BUFFER_BINDINGS],
    bindings: [[BindingSlot; MAX_BINDINGS_PER_SET]; MAX_DESCRIPTOR_SETS],
    index_slot: IndexSlot,
    pipeline: Option<Arc<RenderPipeline>>,
}

impl CommandBuffer {
    pub(crate) fn new(cell: Arc<CommandSinkCell>, device_epoch: Arc<AtomicU64>) -> Self {
        let seen_epoch = device_epoch.load(Ordering::Acquire);
        let mut command_buffer = Self {
            cell,
            device_epoch,
            seen_epoch,
            dirty: DirtyFlags::empty(),
            dirty_sets: 0,
            dirty_vbos: 0,
            vertex_slots: std::array::from_fn(|_| VertexSlot::empty()),
            bindings: std::array::from_fn(|_| std::array::from_fn(|_| BindingSlot::Empty)),
            index_slot: IndexSlot::empty(),
            pipeline: None,
        };
        command_buffer.reset_state();
        command_buffer
    }

    /// Clear all binding slots and mark every dirty category dirty
    ///
    /// Idempotent; called at creation and when recycling the command
    /// buffer. The initial state is always pushed in full on the first
    /// draw after a reset.
    pub fn reset_state(&mut self) {
        self.dirty = DirtyFlags::all();
        self.dirty_sets = !0;
        self.dirty_vbos = !0;
        for slot in self.vertex_slots.iter_mut() {
            *slot = VertexSlot::empty();
        }
        for set in self.bindings.iter_mut() {
            for slot in set.iter_mut() {
                *slot = BindingSlot::Empty;
            }
        }
        self.index_slot = IndexSlot::empty();
        self.pipeline = None;
    }

    /// Begin recording commands
    pub fn begin(&mut self) {
        self.check_device_epoch();
        if let Some(sink) = self.cell.sink.lock().unwrap().as_deref_mut() {
            sink.begin();
        }
    }

    /// Finish recording commands
    pub fn finish(&mut self) {
        if let Some(sink) = self.cell.sink.lock().unwrap().as_deref_mut() {
            sink.finish();
        }
    }

    /// Discard recorded commands and tracked state, ready for reuse
    pub fn reset(&mut self) {
        if let Some(sink) = self.cell.sink.lock().unwrap().as_deref_mut() {
            sink.reset();
        }
        self.reset_state();
    }

    /// Bind a vertex buffer to a binding slot
    ///
    /// A repeated identical call leaves the slot's dirty bit untouched.
    /// Buffer/offset changes dirty only the slot; stride or input-rate
    /// changes additionally dirty the static vertex layout, since those
    /// require re-deriving the backend input layout.
    ///
    /// # Arguments
    ///
    /// * `buffer` - Buffer created with VERTEX usage
    /// * `binding` - Slot index, less than MAX_VERTEX_BUFFER_BINDINGS
    /// * `offset` - Byte offset into the buffer
    /// * `input_rate` - Per-vertex or per-instance stepping
    pub fn set_vertex_buffer(
        &mut self,
        buffer: &Arc<GpuBuffer>,
        binding: u32,
        offset: u64,
        input_rate: VertexInputRate,
    ) {
        debug_assert!(
            (binding as usize) < MAX_VERTEX_BUFFER_BINDINGS,
            "vertex buffer binding {} out of range",
            binding
        );
        debug_assert!(
            buffer.usage().contains(BufferUsage::VERTEX),
            "buffer #{} bound as vertex buffer without VERTEX usage",
            buffer.resource_id()
        );
        if binding as usize >= MAX_VERTEX_BUFFER_BINDINGS {
            return;
        }

        let slot = &mut self.vertex_slots[binding as usize];
        let id = buffer.resource_id();

        if slot.buffer_id != id || slot.offset != offset {
            self.dirty_vbos |= 1 << binding;
        }

        let stride = buffer.element_size();
        if slot.stride != stride || slot.input_rate != input_rate {
            self.dirty |= DirtyFlags::STATIC_VERTEX;
        }

        slot.buffer = Arc::downgrade(buffer);
        slot.buffer_id = id;
        slot.offset = offset;
        slot.stride = stride;
        slot.input_rate = input_rate;
    }

    /// Bind a uniform buffer into a descriptor set slot
    ///
    /// The full buffer is bound (offset 0, the buffer's total size). A
    /// call that repeats the current binding is a no-op.
    pub fn set_uniform_buffer(&mut self, set: u32, slot: u32, buffer: &Arc<GpuBuffer>) {
        debug_assert!(
            buffer.usage().contains(BufferUsage::UNIFORM),
            "buffer #{} bound as uniform buffer without UNIFORM usage",
            buffer.resource_id()
        );
        self.set_buffer_binding(set, slot, buffer, BufferBindKind::Uniform);
    }

    /// Bind a storage buffer into a descriptor set slot
    pub fn set_storage_buffer(&mut self, set: u32, slot: u32, buffer: &Arc<GpuBuffer>) {
        debug_assert!(
            buffer.usage().contains(BufferUsage::STORAGE),
            "buffer #{} bound as storage buffer without STORAGE usage",
            buffer.resource_id()
        );
        self.set_buffer_binding(set, slot, buffer, BufferBindKind::Storage);
    }

    fn set_buffer_binding(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &Arc<GpuBuffer>,
        kind: BufferBindKind,
    ) {
        debug_assert!((set as usize) < MAX_DESCRIPTOR_SETS, "set {} out of range", set);
        debug_assert!(
            (slot as usize) < MAX_BINDINGS_PER_SET,
            "binding slot {} out of range",
            slot
        );
        if set as usize >= MAX_DESCRIPTOR_SETS || slot as usize >= MAX_BINDINGS_PER_SET {
            return;
        }

        let id = buffer.resource_id();
        let range = buffer.size();
        let binding = &mut self.bindings[set as usize][slot as usize];

        if let BindingSlot::Buffer {
            buffer_id,
            offset,
            range: bound_range,
            kind: bound_kind,
            ..
        } = binding
        {
            if *buffer_id == id && *offset == 0 && *bound_range == range && *bound_kind == kind {
                return;
            }
        }

        *binding = BindingSlot::Buffer {
            buffer: Arc::downgrade(buffer),
            buffer_id: id,
            offset: 0,
            range,
            kind,
        };
        self.dirty_sets |= 1 << set;
    }

    /// Bind a texture into a descriptor set slot
    ///
    /// At draw time the binding resolves a full-range shader-read view
    /// through the texture's view cache.
    pub fn set_texture(&mut self, set: u32, slot: u32, texture: &Arc<Texture>) {
        debug_assert!((set as usize) < MAX_DESCRIPTOR_SETS, "set {} out of range", set);
        debug_assert!(
            (slot as usize) < MAX_BINDINGS_PER_SET,
            "binding slot {} out of range",
            slot
        );
        debug_assert!(
            texture.usage().contains(TextureUsage::SHADER_READ),
            "texture #{} bound for sampling without SHADER_READ usage",
            texture.resource_id()
        );
        if set as usize >= MAX_DESCRIPTOR_SETS || slot as usize >= MAX_BINDINGS_PER_SET {
            return;
        }

        let id = texture.resource_id();
        let binding = &mut self.bindings[set as usize][slot as usize];

        if let BindingSlot::Texture { texture_id, .. } = binding {
            if *texture_id == id {
                return;
            }
        }

        *binding = BindingSlot::Texture {
            texture: Arc::downgrade(texture),
            texture_id: id,
        };
        self.dirty_sets |= 1 << set;
    }

    /// Bind a sampler into a descriptor set slot
    pub fn set_sampler(&mut self, set: u32, slot: u32, sampler: &Arc<Sampler>) {
        debug_assert!((set as usize) < MAX_DESCRIPTOR_SETS, "set {} out of range", set);
        debug_assert!(
            (slot as usize) < MAX_BINDINGS_PER_SET,
            "binding slot {} out of range",
            slot
        );
        if set as usize >= MAX_DESCRIPTOR_SETS || slot as usize >= MAX_BINDINGS_PER_SET {
            return;
        }

        let id = sampler.resource_id();
        let binding = &mut self.bindings[set as usize][slot as usize];

        if let BindingSlot::Sampler { sampler_id, .. } = binding {
            if *sampler_id == id {
                return;
            }
        }

        *binding = BindingSlot::Sampler {
            sampler: Arc::downgrade(sampler),
            sampler_id: id,
        };
        self.dirty_sets |= 1 << set;
    }

    /// Bind the index buffer
    pub fn set_index_buffer(&mut self, buffer: &Arc<GpuBuffer>, offset: u64, index_type: IndexType) {
        debug_assert!(
            buffer.usage().contains(BufferUsage::INDEX),
            "buffer #{} bound as index buffer without INDEX usage",
            buffer.resource_id()
        );

        let id = buffer.resource_id();
        if self.index_slot.buffer_id != id
            || self.index_slot.offset != offset
            || self.index_slot.index_type != index_type
        {
            self.dirty |= DirtyFlags::INDEX_BUFFER;
        }

        self.index_slot = IndexSlot {
            buffer: Arc::downgrade(buffer),
            buffer_id: id,
            offset,
            index_type,
        };
    }

    /// Store the desired pipeline; backend resolution is deferred to draw
    /// time
    pub fn set_pipeline(&mut self, pipeline: &Arc<RenderPipeline>) {
        let changed = self
            .pipeline
            .as_ref()
            .map(|current| current.resource_id() != pipeline.resource_id())
            .unwrap_or(true);
        if changed {
            self.dirty |= DirtyFlags::PIPELINE;
        }
        self.pipeline = Some(pipeline.clone());
    }

    /// Begin a render pass targeting the given framebuffer
    ///
    /// Sets a full-target viewport and scissor. Returns false if the
    /// command buffer or framebuffer has been destroyed.
    pub fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<Framebuffer>,
        clear_colors: &[[f32; 4]],
        clear_depth: f32,
        clear_stencil: u8,
    ) -> bool {
        self.check_device_epoch();

        let mut guard = self.cell.sink.lock().unwrap();
        let Some(sink) = guard.as_deref_mut() else {
            rhi_warn!(SOURCE, "begin_render_pass on destroyed command buffer");
            return false;
        };

        let recorded = framebuffer
            .with_handle(|handle| {
                sink.begin_render_pass(handle, clear_colors, clear_depth, clear_stencil);
                sink.set_viewport(Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: framebuffer.width() as f32,
                    height: framebuffer.height() as f32,
                    min_depth: 0.0,
                    max_depth: 1.0,
                });
                sink.set_scissor(Rect2D {
                    x: 0,
                    y: 0,
                    width: framebuffer.width(),
                    height: framebuffer.height(),
                });
            })
            .is_some();

        if !recorded {
            rhi_warn!(SOURCE, "begin_render_pass with destroyed framebuffer");
        }
        recorded
    }

    /// End the current render pass
    pub fn end_render_pass(&mut self) {
        if let Some(sink) = self.cell.sink.lock().unwrap().as_deref_mut() {
            sink.end_render_pass();
        }
    }

    /// Set the viewport
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(sink) = self.cell.sink.lock().unwrap().as_deref_mut() {
            sink.set_viewport(viewport);
        }
    }

    /// Set the scissor rectangle
    pub fn set_scissor(&mut self, scissor: Rect2D) {
        if let Some(sink) = self.cell.sink.lock().unwrap().as_deref_mut() {
            sink.set_scissor(scissor);
        }
    }

    /// Issue a non-indexed draw
    ///
    /// Resolves all dirty state first. Returns whether the draw reached
    /// the backend; a draw with no pipeline bound, a topology mismatch or
    /// a destroyed bound resource is skipped and reported here.
    pub fn draw(
        &mut self,
        topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> bool {
        self.check_device_epoch();

        let cell = self.cell.clone();
        let mut guard = cell.sink.lock().unwrap();
        let Some(sink) = guard.as_deref_mut() else {
            rhi_warn!(SOURCE, "draw on destroyed command buffer");
            return false;
        };

        if !self.prepare_draw(sink, topology, false) {
            return false;
        }

        sink.draw(topology, vertex_count, instance_count, first_vertex, first_instance);
        true
    }

    /// Issue an indexed draw
    ///
    /// Same resolution and skip semantics as `draw`, plus the index buffer
    /// binding is required and resolved last.
    pub fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    ) -> bool {
        self.check_device_epoch();

        let cell = self.cell.clone();
        let mut guard = cell.sink.lock().unwrap();
        let Some(sink) = guard.as_deref_mut() else {
            rhi_warn!(SOURCE, "draw_indexed on destroyed command buffer");
            return false;
        };

        if !self.prepare_draw(sink, topology, true) {
            return false;
        }

        sink.draw_indexed(topology, index_count, instance_count, first_index);
        true
    }

    /// A bumped device epoch means the device was lost and recovered; all
    /// tracked state refers to objects of the old device and must be
    /// re-resolved in full.
    fn check_device_epoch(&mut self) {
        let epoch = self.device_epoch.load(Ordering::Acquire);
        if epoch != self.seen_epoch {
            self.seen_epoch = epoch;
            self.reset_state();
        }
    }

    /// Resolve every dirty category into backend calls, in the fixed
    /// pipeline -> vertex layout/buffers -> descriptor sets -> index
    /// buffer order. Dirty bits are cleared per category as it is pushed.
    fn prepare_draw(
        &mut self,
        sink: &mut dyn CommandSink,
        topology: PrimitiveTopology,
        indexed: bool,
    ) -> bool {
        let Some(pipeline) = self.pipeline.clone() else {
            rhi_warn!(SOURCE, "draw skipped: no pipeline bound");
            return false;
        };

        if pipeline.topology() != topology {
            rhi_warn!(
                SOURCE,
                "draw skipped: pipeline topology {:?} incompatible with requested {:?}",
                pipeline.topology(),
                topology
            );
            return false;
        }

        if self.dirty.contains(DirtyFlags::PIPELINE) {
            let pushed = pipeline
                .with_handle(|handle| sink.set_render_pipeline(handle))
                .is_some();
            if !pushed {
                rhi_warn!(SOURCE, "draw skipped: bound pipeline was destroyed");
                return false;
            }
            self.dirty.remove(DirtyFlags::PIPELINE);
        }

        let bound_mask = self
            .vertex_slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.buffer_id != 0)
            .fold(0u32, |mask, (index, _)| mask | 1 << index);

        if self.dirty.contains(DirtyFlags::STATIC_VERTEX) {
            let layout: Vec<VertexLayoutEntry> = self
                .vertex_slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.buffer_id != 0)
                .map(|(index, slot)| VertexLayoutEntry {
                    binding: index as u32,
                    stride: slot.stride,
                    input_rate: slot.input_rate,
                })
                .collect();
            sink.set_vertex_layout(&layout);
            self.dirty.remove(DirtyFlags::STATIC_VERTEX);
            // A fresh input layout rebinds its buffers as well.
            self.dirty_vbos |= bound_mask;
        }

        let update_mask = self.dirty_vbos & bound_mask;
        for binding in 0..MAX_VERTEX_BUFFER_BINDINGS {
            if update_mask & (1 << binding) == 0 {
                continue;
            }
            let slot = &self.vertex_slots[binding];
            let Some(buffer) = slot.buffer.upgrade() else {
                debug_assert!(
                    false,
                    "vertex buffer in slot {} destroyed while bound",
                    binding
                );
                rhi_warn!(
                    SOURCE,
                    "draw skipped: vertex buffer in slot {} was destroyed while bound",
                    binding
                );
                return false;
            };
            let pushed = buffer
                .with_handle(|handle| sink.set_vertex_buffer(binding as u32, handle, slot.offset))
                .is_some();
            if !pushed {
                rhi_warn!(
                    SOURCE,
                    "draw skipped: vertex buffer in slot {} was destroyed while bound",
                    binding
                );
                return false;
            }
        }
        self.dirty_vbos &= !update_mask;

        if self.dirty_sets != 0 {
            for set in 0..MAX_DESCRIPTOR_SETS {
                if self.dirty_sets & (1 << set) == 0 {
                    continue;
                }
                if !Self::flush_binding_set(&self.bindings[set], set as u32, sink) {
                    return false;
                }
            }
            self.dirty_sets = 0;
        }

        if indexed {
            if self.index_slot.buffer_id == 0 {
                rhi_warn!(SOURCE, "indexed draw skipped: no index buffer bound");
                return false;
            }
            if self.dirty.contains(DirtyFlags::INDEX_BUFFER) {
                let Some(buffer) = self.index_slot.buffer.upgrade() else {
                    debug_assert!(false, "index buffer destroyed while bound");
                    rhi_warn!(SOURCE, "draw skipped: index buffer was destroyed while bound");
                    return false;
                };
                let pushed = buffer
                    .with_handle(|handle| {
                        sink.set_index_buffer(
                            handle,
                            self.index_slot.offset,
                            self.index_slot.index_type,
                        )
                    })
                    .is_some();
                if !pushed {
                    rhi_warn!(SOURCE, "draw skipped: index buffer was destroyed while bound");
                    return false;
                }
                self.dirty.remove(DirtyFlags::INDEX_BUFFER);
            }
        }

        true
    }

    /// Push every occupied slot of one descriptor set to the backend
    fn flush_binding_set(
        bindings: &[BindingSlot; MAX_BINDINGS_PER_SET],
        set: u32,
        sink: &mut dyn CommandSink,
    ) -> bool {
        for (slot_index, binding) in bindings.iter().enumerate() {
            let slot = slot_index as u32;
            match binding {
                BindingSlot::Empty => {}
                BindingSlot::Buffer {
                    buffer,
                    offset,
                    range,
                    kind,
                    ..
                } => {
                    let Some(buffer) = buffer.upgrade() else {
                        debug_assert!(
                            false,
                            "buffer in set {} slot {} destroyed while bound",
                            set, slot
                        );
                        rhi_warn!(
                            SOURCE,
                            "draw skipped: buffer in set {} slot {} was destroyed while bound",
                            set,
                            slot
                        );
                        return false;
                    };
                    let pushed = buffer
                        .with_handle(|handle| match kind {
                            BufferBindKind::Uniform => {
                                sink.bind_uniform_buffer(set, slot, handle, *offset, *range)
                            }
                            BufferBindKind::Storage => {
                                sink.bind_storage_buffer(set, slot, handle, *offset, *range)
                            }
                        })
                        .is_some();
                    if !pushed {
                        rhi_warn!(
                            SOURCE,
                            "draw skipped: buffer in set {} slot {} was destroyed while bound",
                            set,
                            slot
                        );
                        return false;
                    }
                }
                BindingSlot::Texture { texture, .. } => {
                    let Some(texture) = texture.upgrade() else {
                        debug_assert!(
                            false,
                            "texture in set {} slot {} destroyed while bound",
                            set, slot
                        );
                        rhi_warn!(
                            SOURCE,
                            "draw skipped: texture in set {} slot {} was destroyed while bound",
                            set,
                            slot
                        );
                        return false;
                    };
                    let view = texture.shader_read_view(
                        0,
                        REMAINING_MIP_LEVELS,
                        0,
                        REMAINING_ARRAY_LAYERS,
                    );
                    sink.bind_texture_view(set, slot, view.as_ref());
                }
                BindingSlot::Sampler { sampler, .. } => {
                    let Some(sampler) = sampler.upgrade() else {
                        debug_assert!(
                            false,
                            "sampler in set {} slot {} destroyed while bound",
                            set, slot
                        );
                        rhi_warn!(
                            SOURCE,
                            "draw skipped: sampler in set {} slot {} was destroyed while bound",
                            set,
                            slot
                        );
                        return false;
                    };
                    let pushed = sampler
                        .with_handle(|handle| sink.bind_sampler(set, slot, handle))
                        .is_some();
                    if !pushed {
                        rhi_warn!(
                            SOURCE,
                            "draw skipped: sampler in set {} slot {} was destroyed while bound",
                            set,
                            slot
                        );
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;
