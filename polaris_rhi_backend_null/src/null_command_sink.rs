/// Null command sink - records the generated command stream

use std::sync::Arc;

use polaris_rhi::polaris::gpu::{
    BackendBuffer, BackendFramebuffer, BackendPipeline, BackendSampler, CommandSink, IndexType,
    PrimitiveTopology, Rect2D, TextureView, VertexLayoutEntry, Viewport,
};

use crate::null_backend::NullShared;

/// Records every command as an event with the "cmd:" prefix
///
/// The recorded stream is what the state tracker actually pushed: one
/// entry per native call, making redundant-call checks trivial in tests.
pub struct NullCommandSink {
    id: u64,
    shared: Arc<NullShared>,
}

impl NullCommandSink {
    pub(crate) fn new(shared: Arc<NullShared>) -> Self {
        let id = shared.next_id();
        shared.push(format!("create:command_sink#{}", id));
        Self { id, shared }
    }

    fn record(&self, command: String) {
        self.shared.push(format!("cmd:{}", command));
    }
}

impl CommandSink for NullCommandSink {
    fn begin(&mut self) {
        self.record("begin".to_string());
    }

    fn finish(&mut self) {
        self.record("finish".to_string());
    }

    fn reset(&mut self) {
        self.record("reset".to_string());
    }

    fn begin_render_pass(
        &mut self,
        framebuffer: &dyn BackendFramebuffer,
        clear_colors: &[[f32; 4]],
        _clear_depth: f32,
        _clear_stencil: u8,
    ) {
        self.record(format!(
            "begin_render_pass:fb#{}:clears={}",
            framebuffer.native_id(),
            clear_colors.len()
        ));
    }

    fn end_render_pass(&mut self) {
        self.record("end_render_pass".to_string());
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(format!(
            "set_viewport:{}x{}",
            viewport.width as u32, viewport.height as u32
        ));
    }

    fn set_scissor(&mut self, scissor: Rect2D) {
        self.record(format!("set_scissor:{}x{}", scissor.width, scissor.height));
    }

    fn set_render_pipeline(&mut self, pipeline: &dyn BackendPipeline) {
        self.record(format!("set_render_pipeline:#{}", pipeline.native_id()));
    }

    fn set_vertex_layout(&mut self, layout: &[VertexLayoutEntry]) {
        self.record(format!("set_vertex_layout:{}", layout.len()));
    }

    fn set_vertex_buffer(&mut self, binding: u32, buffer: &dyn BackendBuffer, offset: u64) {
        self.record(format!(
            "set_vertex_buffer:{}:#{}:{}",
            binding,
            buffer.native_id(),
            offset
        ));
    }

    fn set_index_buffer(&mut self, buffer: &dyn BackendBuffer, offset: u64, index_type: IndexType) {
        self.record(format!(
            "set_index_buffer:#{}:{}:{:?}",
            buffer.native_id(),
            offset,
            index_type
        ));
    }

    fn bind_uniform_buffer(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &dyn BackendBuffer,
        offset: u64,
        range: u64,
    ) {
        self.record(format!(
            "bind_uniform_buffer:{}:{}:#{}:{}:{}",
            set,
            slot,
            buffer.native_id(),
            offset,
            range
        ));
    }

    fn bind_storage_buffer(
        &mut self,
        set: u32,
        slot: u32,
        buffer: &dyn BackendBuffer,
        offset: u64,
        range: u64,
    ) {
        self.record(format!(
            "bind_storage_buffer:{}:{}:#{}:{}:{}",
            set,
            slot,
            buffer.native_id(),
            offset,
            range
        ));
    }

    fn bind_texture_view(&mut self, set: u32, slot: u32, view: &dyn TextureView) {
        self.record(format!(
            "bind_texture_view:{}:{}:#{}",
            set,
            slot,
            view.native_id()
        ));
    }

    fn bind_sampler(&mut self, set: u32, slot: u32, sampler: &dyn BackendSampler) {
        self.record(format!("bind_sampler:{}:{}:#{}", set, slot, sampler.native_id()));
    }

    fn draw(
        &mut self,
        topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        _first_instance: u32,
    ) {
        self.record(format!(
            "draw:{:?}:{}:{}:{}",
            topology, vertex_count, instance_count, first_vertex
        ));
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    ) {
        self.record(format!(
            "draw_indexed:{:?}:{}:{}:{}",
            topology, index_count, instance_count, first_index
        ));
    }
}

impl Drop for NullCommandSink {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:command_sink#{}", self.id));
    }
}
