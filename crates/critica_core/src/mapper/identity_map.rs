//! Per-category identity map.

use crate::model::oid::Oid;
use parking_lot::Mutex;
use std::collections::HashMap;

/// OID → handle cache guaranteeing a single materialization per id.
///
/// Entries are never evicted; the map lives as long as its mapper.
pub struct IdentityMap<T: Clone> {
    entries: Mutex<HashMap<Oid, T>>,
}

impl<T: Clone> Default for IdentityMap<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> IdentityMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Oid) -> Option<T> {
        self.entries.lock().get(&id).cloned()
    }

    /// Returns the cached handle, or runs `load` and caches its result.
    ///
    /// The map lock is held across `load`, so concurrent misses for the same
    /// id materialize exactly once. `load` must not touch this map.
    pub fn get_or_try_load<E>(&self, id: Oid, load: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let mut entries = self.entries.lock();
        if let Some(handle) = entries.get(&id) {
            return Ok(handle.clone());
        }

        let handle = load()?;
        entries.insert(id, handle.clone());
        Ok(handle)
    }

    /// Points `id` at `handle`, replacing any previous entry.
    pub fn insert(&self, id: Oid, handle: T) {
        self.entries.lock().insert(id, handle);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
