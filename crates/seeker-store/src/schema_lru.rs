use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use seeker_schema::SchemaHandle;

/// Process-wide `endpoint_hash -> shared<Schema>` map (spec §5 "Shared
/// resources: Schema LRU"). Writers CAS via [`SchemaHandle::swap`]; on
/// failure they re-read and retry, the caller's responsibility per the
/// spec's lock-order note — this cache only owns the LRU eviction.
pub struct SchemaLru {
    entries: Mutex<LruCache<u64, SchemaHandle>>,
}

impl SchemaLru {
    pub fn new(capacity: NonZeroUsize) -> Self {
        SchemaLru { entries: Mutex::new(LruCache::new(capacity)) }
    }

    /// Returns the cached handle for `endpoint_hash`, inserting a fresh
    /// one built from `init` if absent.
    pub fn get_or_insert_with(&self, endpoint_hash: u64, init: impl FnOnce() -> SchemaHandle) -> SchemaHandle {
        let mut guard = self.entries.lock();
        if let Some(handle) = guard.get(&endpoint_hash) {
            return handle.clone();
        }
        let handle = init();
        guard.put(endpoint_hash, handle.clone());
        handle
    }

    pub fn invalidate(&self, endpoint_hash: u64) {
        self.entries.lock().pop(&endpoint_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_schema::tree::SchemaRoot;

    #[test]
    fn get_or_insert_reuses_cached_handle() {
        let lru = SchemaLru::new(NonZeroUsize::new(4).unwrap());
        let built = Mutex::new(0u32);
        let make = || {
            *built.lock() += 1;
            SchemaHandle::new(SchemaRoot::new_inline(Default::default()))
        };
        let _h1 = lru.get_or_insert_with(1, make);
        let _h2 = lru.get_or_insert_with(1, make);
        assert_eq!(*built.lock(), 1);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let lru = SchemaLru::new(NonZeroUsize::new(4).unwrap());
        let built = Mutex::new(0u32);
        let make = || {
            *built.lock() += 1;
            SchemaHandle::new(SchemaRoot::new_inline(Default::default()))
        };
        lru.get_or_insert_with(1, make);
        lru.invalidate(1);
        lru.get_or_insert_with(1, make);
        assert_eq!(*built.lock(), 2);
    }
}
