use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use seeker_raft::{NodeTable, RaftState};
use seeker_schema::ChangeMap;
use seeker_store::{Pool, SchemaLru};

use crate::options::ManagerOptions;

/// The single explicit context every component is handed, replacing
/// the source's process-singleton globals (spec §9 "Global mutable
/// state... owned by a single `Manager` context passed explicitly to
/// components"). `Manager` itself owns no locking beyond what its
/// members already provide; cloning it only clones `Arc`s.
#[derive(Clone)]
pub struct Manager {
    pub options: Arc<ManagerOptions>,
    pub pool: Arc<Pool>,
    pub schema_lru: Arc<SchemaLru>,
    pub change_map: Arc<ChangeMap>,
    pub node_table: Arc<NodeTable>,
    pub raft: Arc<Mutex<RaftState>>,
}

impl Manager {
    pub fn new(options: ManagerOptions) -> Self {
        let cache_size = NonZeroUsize::new(options.schema_cache_size.max(1)).unwrap();
        let node_name = options.node_name.clone();
        Manager {
            options: Arc::new(options),
            pool: Arc::new(Pool::new()),
            schema_lru: Arc::new(SchemaLru::new(cache_size)),
            change_map: Arc::new(ChangeMap::default()),
            node_table: Arc::new(NodeTable::new()),
            raft: Arc::new(Mutex::new(RaftState::new(node_name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ManagerOptions {
        ManagerOptions {
            db_path: "./data".into(),
            bind_addr: "127.0.0.1:0".into(),
            raft_multicast_addr: "239.255.0.1:9999".into(),
            cluster_name: "test".into(),
            node_name: "n1".into(),
            log_level: "info".into(),
            schema_cache_size: 16,
        }
    }

    #[test]
    fn new_manager_wires_up_empty_state() {
        let manager = Manager::new(opts());
        assert_eq!(manager.node_table.active_count(), 0);
        assert_eq!(manager.raft.lock().node_id, "n1");
    }
}
