use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// `(content_hash, pre_image_msgpack)` as held for one in-flight write
/// (spec §3 "Document-change map").
#[derive(Debug, Clone)]
pub struct Pair {
    pub content_hash: u64,
    pub pre_image: Vec<u8>,
}

/// Process-wide map keyed by `(endpoint-hash, term-id)`, used only
/// when a script hook is active (spec §4.G). Serializes concurrent
/// writers that observe the same pre-image via an optimistic
/// compare-and-swap, and feeds scripts their pre-image.
#[derive(Debug, Default)]
pub struct ChangeMap {
    entries: Mutex<HashMap<(u64, u64), Arc<Mutex<Pair>>>>,
}

impl ChangeMap {
    pub fn new() -> Self {
        ChangeMap::default()
    }

    /// Returns the cached pair for `(endpoint_hash, term_id)`, or —
    /// when absent — whatever `load_current` returns, inserting it
    /// (spec §4.G `get`: "if absent and the endpoint is local, reads
    /// the current document, inserts, and returns it").
    pub fn get(&self, endpoint_hash: u64, term_id: u64, load_current: impl FnOnce() -> Pair) -> Pair {
        let mut entries = self.entries.lock();
        let slot = entries
            .entry((endpoint_hash, term_id))
            .or_insert_with(|| Arc::new(Mutex::new(load_current())));
        slot.lock().clone()
    }

    /// Optimistic CAS (spec §4.G `set`): replaces the cached pair with
    /// `new_pair` iff `old_pair.content_hash` matches what's currently
    /// cached, or iff no entry exists yet (first writer). Returns
    /// whether the write was accepted.
    pub fn set(&self, endpoint_hash: u64, term_id: u64, new_pair: Pair, old_pair: Option<&Pair>) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(&(endpoint_hash, term_id)) {
            Some(slot) => {
                let mut current = slot.lock();
                let accepted = match old_pair {
                    Some(old) => old.content_hash == current.content_hash,
                    None => true,
                };
                if accepted {
                    *current = new_pair;
                }
                accepted
            }
            None => {
                entries.insert((endpoint_hash, term_id), Arc::new(Mutex::new(new_pair)));
                true
            }
        }
    }

    /// Drops the entry when no longer referenced elsewhere (spec §4.G
    /// `dec`). Here "unused" is approximated by strong-count after
    /// dropping our own table reference, since callers only ever clone
    /// the `Pair`'s content out of the `Arc`, never the `Arc` itself.
    pub fn dec(&self, endpoint_hash: u64, term_id: u64) {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.get(&(endpoint_hash, term_id)) {
            if Arc::strong_count(slot) <= 1 {
                entries.remove(&(endpoint_hash, term_id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_is_always_accepted() {
        let map = ChangeMap::new();
        let accepted = map.set(1, 1, Pair { content_hash: 10, pre_image: vec![1] }, None);
        assert!(accepted);
    }

    #[test]
    fn cas_rejects_stale_pre_image() {
        let map = ChangeMap::new();
        map.set(1, 1, Pair { content_hash: 10, pre_image: vec![1] }, None);

        let stale = Pair { content_hash: 999, pre_image: vec![0] };
        let accepted = map.set(1, 1, Pair { content_hash: 20, pre_image: vec![2] }, Some(&stale));
        assert!(!accepted);

        let fresh = Pair { content_hash: 10, pre_image: vec![1] };
        let accepted = map.set(1, 1, Pair { content_hash: 20, pre_image: vec![2] }, Some(&fresh));
        assert!(accepted);
    }

    #[test]
    fn get_loads_current_on_first_access() {
        let map = ChangeMap::new();
        let pair = map.get(1, 1, || Pair { content_hash: 5, pre_image: vec![9] });
        assert_eq!(pair.content_hash, 5);
        let cached = map.get(1, 1, || panic!("should not reload"));
        assert_eq!(cached.content_hash, 5);
    }

    #[test]
    fn dec_removes_unreferenced_entry() {
        let map = ChangeMap::new();
        map.set(1, 1, Pair { content_hash: 1, pre_image: vec![] }, None);
        map.dec(1, 1);
        assert_eq!(map.entries.lock().len(), 0);
    }
}
