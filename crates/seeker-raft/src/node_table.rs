use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// A cluster member, keyed by `(idx, name)` (spec §4.I "Apply is
/// idempotent: it updates the cluster membership table (add/update
/// node by `(idx, name)`)").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub idx: u64,
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// Copy-on-write membership table (spec §5 "Shared resources: Node
/// table: copy-on-write; updates via Raft apply").
#[derive(Debug, Default)]
pub struct NodeTable {
    current: RwLock<Arc<BTreeMap<u64, NodeEntry>>>,
}

impl NodeTable {
    pub fn new() -> Self {
        NodeTable { current: RwLock::new(Arc::new(BTreeMap::new())) }
    }

    pub fn snapshot(&self) -> Arc<BTreeMap<u64, NodeEntry>> {
        self.current.read().clone()
    }

    /// Applies an add/update of `entry`, idempotently: applying the
    /// same entry twice leaves the table unchanged.
    pub fn apply(&self, entry: NodeEntry) {
        let mut guard = self.current.write();
        if guard.get(&entry.idx) == Some(&entry) {
            return;
        }
        let mut next = (**guard).clone();
        next.insert(entry.idx, entry);
        *guard = Arc::new(next);
    }

    pub fn active_count(&self) -> usize {
        self.current.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_idempotent() {
        let table = NodeTable::new();
        let entry = NodeEntry { idx: 1, name: "n1".into(), host: "127.0.0.1".into(), port: 9000 };
        table.apply(entry.clone());
        let snap1 = table.snapshot();
        table.apply(entry);
        let snap2 = table.snapshot();
        assert!(Arc::ptr_eq(&snap1, &snap2));
    }

    #[test]
    fn apply_updates_existing_entry() {
        let table = NodeTable::new();
        table.apply(NodeEntry { idx: 1, name: "n1".into(), host: "a".into(), port: 1 });
        table.apply(NodeEntry { idx: 1, name: "n1".into(), host: "b".into(), port: 2 });
        let snap = table.snapshot();
        assert_eq!(snap.get(&1).unwrap().host, "b");
    }
}
