//! The native resource dedup registry.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use parking_lot::Mutex;


/// Identity of a wrapped native resource.
///
/// D3D9 surfaces carry a plane; D3D10 and D3D11 resources never do (D3D11
/// planes are a geometry property of the image, not part of the identity).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub resource: usize,
    pub subresource: u32,
    pub plane: Option<u32>,
}


/// Tracks which native resources are currently wrapped by a memory object.
#[derive(Default)]
pub struct InteropRegistry {
    entries: Mutex<HashSet<ResourceKey>>,
}

impl InteropRegistry {
    pub fn new() -> InteropRegistry {
        InteropRegistry::default()
    }

    /// Inserts `key`, returning a registration which erases it again when
    /// dropped. Returns `None` if the key is already present.
    pub fn register(self: &Arc<Self>, key: ResourceKey) -> Option<Registration> {
        let mut entries = self.entries.lock();
        if !entries.insert(key) {
            return None;
        }
        trace!("InteropRegistry: registered {:?}.", key);
        Some(Registration { registry: self.clone(), key, erased: false })
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for InteropRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InteropRegistry")
            .field("entries", &self.len())
            .finish()
    }
}


/// A live registry entry.
pub struct Registration {
    registry: Arc<InteropRegistry>,
    key: ResourceKey,
    erased: bool,
}

impl Registration {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Runs `f` and erases the entry while holding the registry lock.
    pub fn erase_with<F: FnOnce()>(mut self, f: F) {
        {
            let mut entries = self.registry.entries.lock();
            f();
            entries.remove(&self.key);
        }
        self.erased = true;
        trace!("InteropRegistry: erased {:?}.", self.key);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.erased {
            return;
        }
        self.registry.entries.lock().remove(&self.key);
        trace!("InteropRegistry: erased {:?}.", self.key);
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Registration").field("key", &self.key).finish()
    }
}
