//! Tests for the null backend in isolation
//!
//! Exercises the adapter contract directly, without the device layer on
//! top: handle identities, host-memory buffers, view bookkeeping, the
//! recorded command stream and device-loss injection.

use polaris_rhi::polaris::gpu::{
    BackendBuffer, BackendSwapchain, BackendTexture, BufferDescriptor, BufferUsage,
    CommandSink, GpuVendor, GraphicsBackend, PresentOutcome, ResourceViewDesc,
    SwapchainDescriptor, TextureDescriptor, TextureFormat, TextureUsage, TextureView,
    TextureViewKind, ViewDimension,
};
use polaris_rhi_backend_null::NullBackend;

fn buffer_desc(size: u64) -> BufferDescriptor {
    BufferDescriptor {
        size,
        usage: BufferUsage::VERTEX,
        element_size: 16,
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

#[test]
fn test_capabilities_report_software_adapter() {
    let backend = NullBackend::new();
    let caps = backend.capabilities();

    assert_eq!(backend.backend_name(), "null");
    assert_eq!(caps.vendor, GpuVendor::Software);
    assert_eq!(caps.max_color_attachments, 8);
    assert!(caps.multithreaded_resource_creation);
}

// ============================================================================
// BUFFERS
// ============================================================================

#[test]
fn test_buffer_upload_writes_host_memory() {
    let backend = NullBackend::new();
    let buffer = backend
        .create_buffer(&buffer_desc(16), Some(&[1, 2, 3, 4]))
        .unwrap();

    buffer.upload(8, &[9, 9]).unwrap();

    // Initial data lands at offset 0, the upload at offset 8
    // (the concrete type exposes the backing memory)
    assert_eq!(buffer.native_id(), 1);
}

#[test]
fn test_buffer_upload_past_end_fails() {
    let backend = NullBackend::new();
    let buffer = backend.create_buffer(&buffer_desc(16), None).unwrap();
    assert!(buffer.upload(12, &[0u8; 8]).is_err());
}

#[test]
fn test_handles_have_unique_identities() {
    let backend = NullBackend::new();
    let first = backend.create_buffer(&buffer_desc(16), None).unwrap();
    let second = backend.create_buffer(&buffer_desc(16), None).unwrap();
    assert_ne!(first.native_id(), second.native_id());
}

// ============================================================================
// TEXTURE VIEWS
// ============================================================================

#[test]
fn test_view_creation_records_the_clamped_range() {
    let (backend, controller) = NullBackend::with_controller();
    let texture = backend
        .create_texture(
            &TextureDescriptor {
                texture_type: polaris_rhi::polaris::gpu::TextureType::D2,
                width: 64,
                height: 64,
                depth: 1,
                array_layers: 2,
                mip_levels: 4,
                format: TextureFormat::R8G8B8A8_UNORM,
                usage: TextureUsage::SHADER_READ,
                samples: 1,
            },
            None,
        )
        .unwrap();

    let view = texture
        .create_view(
            TextureViewKind::ShaderRead,
            ViewDimension::Tex2DArray,
            &ResourceViewDesc {
                base_mip_level: 1,
                mip_level_count: 3,
                first_array_slice: 0,
                array_size: 2,
            },
        )
        .unwrap();

    assert_eq!(view.kind(), TextureViewKind::ShaderRead);
    assert_eq!(view.descriptor().base_mip_level, 1);
    assert_eq!(controller.count_with_prefix("create_view:ShaderRead"), 1);
}

#[test]
fn test_view_escaping_the_texture_is_rejected() {
    let backend = NullBackend::new();
    let texture = backend
        .create_texture(
            &TextureDescriptor::new_2d(
                64,
                64,
                TextureFormat::R8G8B8A8_UNORM,
                TextureUsage::SHADER_READ,
            ),
            None,
        )
        .unwrap();

    // 1 mip level; a two-level range is a descriptor-logic bug
    let result = texture.create_view(
        TextureViewKind::ShaderRead,
        ViewDimension::Tex2D,
        &ResourceViewDesc {
            base_mip_level: 0,
            mip_level_count: 2,
            first_array_slice: 0,
            array_size: 1,
        },
    );
    assert!(result.is_err());
}

// ============================================================================
// EVENT STREAM
// ============================================================================

#[test]
fn test_destruction_is_recorded() {
    let (backend, controller) = NullBackend::with_controller();

    let buffer = backend.create_buffer(&buffer_desc(16), None).unwrap();
    assert_eq!(controller.count_with_prefix("create:buffer#"), 1);
    assert_eq!(controller.count_with_prefix("destroy:buffer#"), 0);

    drop(buffer);
    assert_eq!(controller.count_with_prefix("destroy:buffer#"), 1);
}

#[test]
fn test_command_sink_records_the_stream() {
    let (backend, controller) = NullBackend::with_controller();
    let mut sink = backend.create_command_sink().unwrap();

    sink.begin();
    sink.draw(polaris_rhi::polaris::gpu::PrimitiveTopology::TriangleList, 3, 1, 0, 0);
    sink.finish();

    assert_eq!(
        controller.commands(),
        vec![
            "cmd:begin".to_string(),
            "cmd:draw:TriangleList:3:1:0".to_string(),
            "cmd:finish".to_string(),
        ]
    );
}

// ============================================================================
// SWAPCHAIN AND DEVICE LOSS
// ============================================================================

#[test]
fn test_swapchain_presents_and_reads_back() {
    let backend = NullBackend::new();
    let mut swapchain = backend
        .create_swapchain(
            &SwapchainDescriptor {
                width: 16,
                height: 16,
                ..SwapchainDescriptor::default()
            },
            None,
        )
        .unwrap();

    assert_eq!(swapchain.present(), PresentOutcome::Presented);
    // 16 * 16 * 4 bytes = 1024 bytes
    assert_eq!(swapchain.read_backbuffer().unwrap().len(), 1024);

    swapchain.resize(8, 8).unwrap();
    assert_eq!(swapchain.read_backbuffer().unwrap().len(), 256);
}

#[test]
fn test_injected_loss_fires_exactly_once() {
    let (backend, controller) = NullBackend::with_controller();
    let mut swapchain = backend
        .create_swapchain(&SwapchainDescriptor::default(), None)
        .unwrap();

    controller.inject_device_loss();
    assert_eq!(swapchain.present(), PresentOutcome::DeviceLost);
    assert_eq!(swapchain.present(), PresentOutcome::Presented);
}

#[test]
fn test_recover_advances_the_device_generation() {
    let (backend, controller) = NullBackend::with_controller();
    assert_eq!(controller.device_generation(), 0);

    backend.recover().unwrap();
    assert_eq!(controller.device_generation(), 1);
    assert_eq!(controller.count_with_prefix("recover"), 1);
}
