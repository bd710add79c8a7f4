/// GPU resource lifecycle model and the device-wide resource registry
///
/// Every resource created through the device registers itself here so the
/// device can tear everything down in dependency order at shutdown and walk
/// all live resources during device-loss recovery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::error::Result;
use crate::gpu::backend::GraphicsBackend;

new_key_type! {
    /// Generational key identifying a registry entry
    pub struct ResourceKey;
}

/// Kind tag for a GPU resource
///
/// The variant order is the teardown order: kinds that reference other
/// resources come first so that dependents are destroyed before the
/// resources they depend on (a framebuffer's views are released before the
/// texture they address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GpuResourceType {
    CommandBuffer = 0,
    Framebuffer = 1,
    Pipeline = 2,
    Shader = 3,
    Sampler = 4,
    Texture = 5,
    Buffer = 6,
}

impl GpuResourceType {
    /// Ordinal used to sort resources for teardown (ascending) and
    /// device-loss recreation (descending)
    pub fn teardown_order(self) -> u32 {
        self as u32
    }
}

/// Lifecycle interface implemented by every device-created resource
///
/// `destroy` releases the native object and is idempotent; a destroyed
/// resource must never be used again (binding a destroyed resource is a
/// caller contract violation caught at draw resolution). `invalidate` and
/// `recreate` are the device-loss hooks: `invalidate` drops native handles
/// that belong to the lost device, `recreate` rebuilds them from the
/// resource's immutable descriptor on the recovered device.
pub trait GpuResource: Send + Sync {
    /// The resource's kind tag
    fn resource_type(&self) -> GpuResourceType;

    /// Unique identity, assigned at creation, never reused
    fn resource_id(&self) -> u64;

    /// Release the native object. Idempotent.
    fn destroy(&self);

    /// Whether `destroy` has run
    fn is_destroyed(&self) -> bool;

    /// Drop native handles belonging to a lost device
    fn invalidate(&self);

    /// Rebuild native handles on a recovered device
    fn recreate(&self, backend: &dyn GraphicsBackend) -> Result<()>;
}

/// Hands out unique resource identities
///
/// Ids start at 1; 0 is reserved to mean "no resource" in binding slots.
pub(crate) fn next_resource_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct RegistryEntry {
    resource_type: GpuResourceType,
    resource: Weak<dyn GpuResource>,
}

/// Device-wide registry of live GPU resources
///
/// Entries are weak: dropping the last user reference to a resource removes
/// it from the registry, while the device can still reach every live
/// resource for bulk teardown and device-loss recovery. The registry is one
/// of the two structures in this crate that require a lock (resources may
/// be created or dropped from threads other than the render thread).
pub struct ResourceRegistry {
    entries: Mutex<SlotMap<ResourceKey, RegistryEntry>>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Track a resource; returns the key the resource uses to deregister
    pub fn register(
        &self,
        resource_type: GpuResourceType,
        resource: Weak<dyn GpuResource>,
    ) -> ResourceKey {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(RegistryEntry {
            resource_type,
            resource,
        })
    }

    /// Stop tracking a resource (called from resource drop)
    pub fn deregister(&self, key: ResourceKey) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
    }

    /// Number of tracked entries (including entries whose resource is
    /// currently being dropped)
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether no resources are tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collect strong references to every live resource, sorted by
    /// teardown order (dependents first)
    pub fn live_resources(&self) -> Vec<Arc<dyn GpuResource>> {
        let entries = self.entries.lock().unwrap();
        let mut live: Vec<Arc<dyn GpuResource>> = entries
            .values()
            .filter_map(|entry| entry.resource.upgrade())
            .collect();
        live.sort_by_key(|resource| resource.resource_type().teardown_order());
        live
    }

    /// Destroy every live resource in teardown order and clear the registry
    ///
    /// Returns the number of resources destroyed.
    pub fn teardown(&self) -> usize {
        let live = self.live_resources();
        for resource in &live {
            resource.destroy();
        }
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        live.len()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A resource's link back to the registry that tracks it
///
/// Holds the registry weakly: the binding never keeps the device alive, it
/// only deregisters the resource on drop if the registry still exists.
pub(crate) struct RegistryBinding {
    registry: Weak<ResourceRegistry>,
    key: OnceLock<ResourceKey>,
}

impl RegistryBinding {
    pub(crate) fn new(registry: &Arc<ResourceRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            key: OnceLock::new(),
        }
    }

    /// Record the key assigned by the registry at registration time
    pub(crate) fn bind(&self, key: ResourceKey) {
        let _ = self.key.set(key);
    }

    /// Deregister from the registry, if both still exist
    pub(crate) fn release(&self) {
        if let (Some(registry), Some(key)) = (self.registry.upgrade(), self.key.get()) {
            registry.deregister(*key);
        }
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
