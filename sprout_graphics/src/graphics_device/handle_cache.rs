/// Value-keyed cache of native handles
///
/// Structurally equal keys map to one native handle; a miss creates exactly
/// one. Used by every backend for sampler objects.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::graphics_device::Sampler;

pub struct HandleCache<K, H> {
    entries: FxHashMap<K, H>,
}

/// Cache of native sampler objects keyed by the sampler description
pub type SamplerCache<H> = HandleCache<Sampler, H>;

impl<K: Eq + Hash + Clone, H: Clone> HandleCache<K, H> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Return the cached handle for `key`, calling `create` on a miss
    ///
    /// A failing `create` leaves the cache unchanged.
    pub fn get_or_create<F>(&mut self, key: &K, create: F) -> Result<H>
    where
        F: FnOnce(&K) -> Result<H>,
    {
        if let Some(handle) = self.entries.get(key) {
            return Ok(handle.clone());
        }
        let handle = create(key)?;
        self.entries.insert(key.clone(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, key: &K) -> Option<&H> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, handing the handles back for destruction
    pub fn drain(&mut self) -> impl Iterator<Item = (K, H)> + '_ {
        self.entries.drain()
    }
}

impl<K: Eq + Hash + Clone, H: Clone> Default for HandleCache<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "handle_cache_tests.rs"]
mod tests;
