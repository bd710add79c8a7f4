/// Graphics context - backend selection and cross-thread command queuing
///
/// The context is an explicitly constructed object: backends are registered
/// on a builder and the built context is passed to whatever code needs it.
/// There is no ambient global graphics instance.
///
/// Worker threads may enqueue deferred device commands at any time; the
/// owning thread drains and executes them in FIFO order during an explicit
/// flush/process step.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::gpu::backend::GraphicsBackend;
use crate::gpu::graphics_device::GraphicsDevice;
use crate::{rhi_error, rhi_info, rhi_warn};

const SOURCE: &str = "polaris::GraphicsContext";

/// Selectable graphics backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Pick the best registered backend for the running platform
    Default,
    /// Headless software/null backend
    Null,
    /// Vulkan backend
    Vulkan,
    /// Direct3D 11 backend
    Direct3D11,
    /// Direct3D 12 backend
    Direct3D12,
}

/// Graphics context configuration
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Requested backend
    pub backend: BackendKind,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Polaris Application".to_string(),
            app_version: (1, 0, 0),
            backend: BackendKind::Default,
        }
    }
}

/// A deferred command executed on the thread that drains the queue
pub type DeferredCommand = Box<dyn FnOnce(&GraphicsDevice) + Send>;

/// Backend factory function type
type BackendFactory = Box<dyn Fn(&ContextConfig) -> Result<Box<dyn GraphicsBackend>> + Send + Sync>;

/// Fallback order used when the requested backend is unavailable or
/// `BackendKind::Default` is requested
const BACKEND_PREFERENCE: [BackendKind; 4] = [
    BackendKind::Vulkan,
    BackendKind::Direct3D12,
    BackendKind::Direct3D11,
    BackendKind::Null,
];

/// Builder assembling a graphics context from registered backend factories
///
/// # Example
///
/// ```no_run
/// use polaris_rhi::polaris::{ContextConfig, GraphicsContextBuilder};
///
/// let context = GraphicsContextBuilder::new(ContextConfig::default())
///     .register_backend(polaris_rhi::polaris::BackendKind::Null, |_config| {
///         // return Ok(Box::new(MyBackend::new()))
/// #       unimplemented!()
///     })
///     .build()?;
/// # Ok::<(), polaris_rhi::polaris::Error>(())
/// ```
pub struct GraphicsContextBuilder {
    config: ContextConfig,
    factories: HashMap<BackendKind, BackendFactory>,
}

impl GraphicsContextBuilder {
    /// Create a builder with the given configuration
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory under a backend kind
    pub fn register_backend<F>(mut self, kind: BackendKind, factory: F) -> Self
    where
        F: Fn(&ContextConfig) -> Result<Box<dyn GraphicsBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
        self
    }

    /// Backend kinds with a registered factory
    pub fn available_backends(&self) -> Vec<BackendKind> {
        BACKEND_PREFERENCE
            .iter()
            .copied()
            .filter(|kind| self.factories.contains_key(kind))
            .collect()
    }

    /// Select a backend, create the device and build the context
    ///
    /// A concrete requested backend is used when registered; otherwise the
    /// selection falls back through the preference order, ending at the
    /// null backend.
    pub fn build(self) -> Result<GraphicsContext> {
        let requested = self.config.backend;

        let selected = if requested != BackendKind::Default
            && self.factories.contains_key(&requested)
        {
            requested
        } else {
            if requested != BackendKind::Default {
                rhi_error!(SOURCE, "{:?} graphics backend not supported", requested);
            }
            BACKEND_PREFERENCE
                .iter()
                .copied()
                .find(|kind| self.factories.contains_key(kind))
                .ok_or_else(|| {
                    Error::InitializationFailed("no graphics backend registered".to_string())
                })?
        };

        rhi_info!(SOURCE, "Using {:?} graphics backend", selected);

        let factory = self
            .factories
            .get(&selected)
            .expect("selected backend has a registered factory");
        let backend = factory(&self.config)?;
        let device = GraphicsDevice::new(backend)?;

        Ok(GraphicsContext {
            backend_kind: selected,
            device,
            command_queue: Mutex::new(VecDeque::new()),
            queue_state: Mutex::new(QueueState {
                can_add_commands: true,
                queue_finished: false,
            }),
            queue_condvar: Condvar::new(),
        })
    }
}

struct QueueState {
    can_add_commands: bool,
    queue_finished: bool,
}

/// Top-level graphics object: owns the device and the deferred command
/// queue
pub struct GraphicsContext {
    backend_kind: BackendKind,
    device: GraphicsDevice,
    command_queue: Mutex<VecDeque<DeferredCommand>>,
    queue_state: Mutex<QueueState>,
    queue_condvar: Condvar,
}

impl GraphicsContext {
    /// The backend kind the context was built with
    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    /// The graphics device
    pub fn device(&self) -> &GraphicsDevice {
        &self.device
    }

    /// Enqueue a deferred command
    ///
    /// May be called from any thread. The command runs on the thread that
    /// drains the queue, in enqueue order. Once enqueued, a command cannot
    /// be cancelled.
    pub fn queue_command<F>(&self, command: F)
    where
        F: FnOnce(&GraphicsDevice) + Send + 'static,
    {
        let mut queue = self.command_queue.lock().unwrap();
        queue.push_back(Box::new(command));
    }

    /// Mark the queue finished for this cycle and wake the draining thread
    ///
    /// Every command enqueued before this call is guaranteed to execute, in
    /// enqueue order, before the matching `process_commands` returns.
    pub fn flush_commands(&self) {
        let mut state = self.queue_state.lock().unwrap();
        state.can_add_commands = false;
        state.queue_finished = true;
        self.queue_condvar.notify_all();
    }

    /// Wait for a flush, then drain and execute queued commands in FIFO
    /// order
    ///
    /// Blocks until `flush_commands` is called (a rendezvous, not async
    /// scheduling). Called by the thread that owns rendering.
    pub fn process_commands(&self) {
        {
            let mut state = self.queue_state.lock().unwrap();
            while !state.queue_finished {
                state = self.queue_condvar.wait(state).unwrap();
            }
            state.queue_finished = false;
            // Allow producers to enqueue for the next cycle.
            state.can_add_commands = true;
        }

        self.drain_queue();
    }

    /// Execute queued commands in FIFO order until the queue is empty
    fn drain_queue(&self) {
        loop {
            let command = {
                let mut queue = self.command_queue.lock().unwrap();
                match queue.pop_front() {
                    Some(command) => command,
                    None => break,
                }
            };
            command(&self.device);
        }
    }

    /// Queue a deferred backbuffer capture
    ///
    /// The capture runs on the draining thread; image encoding is left to
    /// the caller consuming the captured bytes.
    pub fn save_screenshot(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.queue_command(move |device| match device.capture_backbuffer() {
            Ok(pixels) => rhi_info!(
                SOURCE,
                "captured backbuffer ({} bytes) for {}",
                pixels.len(),
                path.display()
            ),
            Err(err) => rhi_error!(SOURCE, "screenshot capture failed: {}", err),
        });
    }

    /// Present the current frame through the device
    pub fn present(&self) -> Result<()> {
        self.device.present()
    }

    /// Drain any remaining queued commands, then shut the device down
    pub fn shutdown(&self) {
        {
            let state = self.queue_state.lock().unwrap();
            if !state.can_add_commands {
                rhi_warn!(SOURCE, "shutdown during an unprocessed flush cycle");
            }
        }
        self.drain_queue();
        self.device.shutdown();
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
