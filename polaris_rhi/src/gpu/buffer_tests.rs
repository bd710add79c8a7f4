//! Unit tests for GPU buffers
//!
//! Exercises sub-region upload validation and the destroyed-buffer error
//! path against the recording mock backend.

use super::*;
use crate::gpu::graphics_device::GraphicsDevice;
use crate::gpu::mock_backend::{MockBackend, MockShared};
use std::sync::Arc;

fn mock_device() -> (GraphicsDevice, Arc<MockShared>) {
    let backend = MockBackend::new();
    let shared = backend.shared();
    let device = GraphicsDevice::new(Box::new(backend)).unwrap();
    (device, shared)
}

fn vertex_buffer_desc(size: u64) -> BufferDescriptor {
    BufferDescriptor {
        size,
        usage: BufferUsage::VERTEX,
        element_size: 16,
    }
}

// ============================================================================
// DESCRIPTOR ACCESSORS
// ============================================================================

#[test]
fn test_buffer_exposes_descriptor() {
    let (device, _shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(256), None).unwrap();

    assert_eq!(buffer.size(), 256);
    assert_eq!(buffer.element_size(), 16);
    assert!(buffer.usage().contains(BufferUsage::VERTEX));
}

// ============================================================================
// SUB-REGION UPLOAD
// ============================================================================

#[test]
fn test_update_within_bounds_reaches_backend() {
    let (device, shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(64), None).unwrap();

    buffer.update(16, &[0u8; 32]).unwrap();

    // The upload reaches the native object with the requested range
    assert_eq!(shared.count_with_prefix("upload:buffer#"), 1);
}

#[test]
fn test_update_out_of_range_is_rejected() {
    let (device, shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(64), None).unwrap();

    // 48 + 32 = 80 bytes exceeds the 64-byte buffer
    let result = buffer.update(48, &[0u8; 32]);
    assert!(result.is_err());
    assert_eq!(shared.count_with_prefix("upload:buffer#"), 0);
}

#[test]
fn test_update_at_exact_end_is_accepted() {
    let (device, _shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(64), None).unwrap();

    // 32 + 32 = 64 bytes fills the buffer exactly
    assert!(buffer.update(32, &[0u8; 32]).is_ok());
}

// ============================================================================
// DESTRUCTION
// ============================================================================

#[test]
fn test_update_after_destroy_fails() {
    let (device, _shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(64), None).unwrap();

    buffer.destroy();
    assert!(buffer.is_destroyed());
    assert!(buffer.update(0, &[0u8; 4]).is_err());
}

#[test]
fn test_destroy_is_idempotent() {
    let (device, shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(64), None).unwrap();

    buffer.destroy();
    buffer.destroy();

    // The native object is released exactly once
    assert_eq!(shared.count_with_prefix("destroy:buffer#"), 1);
}

#[test]
fn test_drop_deregisters_from_device() {
    let (device, _shared) = mock_device();
    let buffer = device.create_buffer(&vertex_buffer_desc(64), None).unwrap();
    assert_eq!(device.resource_count(), 1);

    drop(buffer);
    assert_eq!(device.resource_count(), 0);
}
