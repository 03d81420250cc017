use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::specification::{Specification, DB_VERSION_SCHEMA};

/// A node of the persistent schema tree (spec §3 "Schema tree"): the
/// field's own specification plus its children keyed by segment name.
/// A *foreign* root instead carries only a pointer to another index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SchemaNode {
    Inline { spec: Specification, children: BTreeMap<String, SchemaNode> },
    Foreign { endpoint: String },
}

impl SchemaNode {
    pub fn new_inline(spec: Specification) -> Self {
        SchemaNode::Inline { spec, children: BTreeMap::new() }
    }

    pub fn spec(&self) -> Option<&Specification> {
        match self {
            SchemaNode::Inline { spec, .. } => Some(spec),
            SchemaNode::Foreign { .. } => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Inline { children, .. } => children.get(name),
            SchemaNode::Foreign { .. } => None,
        }
    }
}

/// The root of a persisted schema (spec §3: "Root carries a `version`
/// ... and either an inline object or a *foreign* reference").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRoot {
    pub version: u32,
    pub root: SchemaNode,
}

impl SchemaRoot {
    pub fn new_inline(spec: Specification) -> Self {
        SchemaRoot { version: DB_VERSION_SCHEMA, root: SchemaNode::new_inline(spec) }
    }

    pub fn new_foreign(endpoint: String) -> Self {
        SchemaRoot { version: DB_VERSION_SCHEMA, root: SchemaNode::Foreign { endpoint } }
    }
}

/// An atomically-swapped pointer to the current schema, matching the
/// teacher's `GlobalFieldsIdsMap` pattern of reading through a shared
/// `RwLock` and only taking the write lock to publish a new version
/// (spec §3: "the schema LRU atomically swaps pointers on commit and
/// re-reads if another writer won").
#[derive(Debug, Clone)]
pub struct SchemaHandle {
    current: Arc<RwLock<Arc<SchemaRoot>>>,
}

impl SchemaHandle {
    pub fn new(initial: SchemaRoot) -> Self {
        SchemaHandle { current: Arc::new(RwLock::new(Arc::new(initial))) }
    }

    /// Snapshot of the schema as of this call; a writer building a
    /// detached mutable copy should start from this.
    pub fn snapshot(&self) -> Arc<SchemaRoot> {
        self.current.read().clone()
    }

    /// Publishes a new schema version, returning the version that was
    /// in effect just before the swap (callers compare it against the
    /// snapshot they started from to detect a lost race and re-merge).
    pub fn swap(&self, new_root: SchemaRoot) -> Arc<SchemaRoot> {
        let mut guard = self.current.write();
        std::mem::replace(&mut *guard, Arc::new(new_root))
    }
}
