/// Null swapchain - offscreen backbuffer with device-loss injection

use std::sync::atomic::Ordering;
use std::sync::Arc;

use polaris_rhi::polaris::gpu::{BackendSwapchain, PresentOutcome, SwapchainDescriptor};
use polaris_rhi::polaris::Result;

use crate::null_backend::NullShared;

/// Presents into host memory; reports an injected device loss exactly once
pub struct NullSwapchain {
    id: u64,
    desc: SwapchainDescriptor,
    backbuffer: Vec<u8>,
    shared: Arc<NullShared>,
}

impl NullSwapchain {
    pub(crate) fn new(shared: Arc<NullShared>, desc: SwapchainDescriptor) -> Self {
        let id = shared.next_id();
        shared.push(format!(
            "create:swapchain#{} ({}x{})",
            id, desc.width, desc.height
        ));
        let backbuffer = Self::allocate_backbuffer(&desc);
        Self {
            id,
            desc,
            backbuffer,
            shared,
        }
    }

    fn allocate_backbuffer(desc: &SwapchainDescriptor) -> Vec<u8> {
        let bytes =
            desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel() as usize;
        vec![0u8; bytes]
    }
}

impl BackendSwapchain for NullSwapchain {
    fn present(&mut self) -> PresentOutcome {
        if self.shared.lose_next_present.swap(false, Ordering::AcqRel) {
            self.shared.push("present:device_lost".to_string());
            return PresentOutcome::DeviceLost;
        }
        self.shared.push("present".to_string());
        PresentOutcome::Presented
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.desc.width = width;
        self.desc.height = height;
        self.backbuffer = Self::allocate_backbuffer(&self.desc);
        Ok(())
    }

    fn read_backbuffer(&self) -> Result<Vec<u8>> {
        Ok(self.backbuffer.clone())
    }
}

impl Drop for NullSwapchain {
    fn drop(&mut self) {
        self.shared.push(format!("destroy:swapchain#{}", self.id));
    }
}
