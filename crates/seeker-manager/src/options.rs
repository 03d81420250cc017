use std::path::PathBuf;

use clap::Parser;

fn default_db_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8890".to_string()
}

fn default_raft_multicast_addr() -> String {
    "239.255.0.1:9999".to_string()
}

fn default_cluster_name() -> String {
    "seeker".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Process-wide configuration, loaded once at startup and passed
/// explicitly into [`crate::manager::Manager`] (spec §9 "Global mutable
/// state... should be owned by a single `Manager` context passed
/// explicitly to components"), mirroring the teacher's plain
/// `Opt`/`IndexSchedulerOptions` option structs.
#[derive(Debug, Clone, Parser)]
#[clap(version, about = "database node manager")]
pub struct ManagerOptions {
    /// Directory holding per-endpoint databases.
    #[clap(long, env = "SEEKER_DB_PATH", default_value_os_t = default_db_path())]
    pub db_path: PathBuf,

    /// TCP address the remote binary protocol listens on.
    #[clap(long, env = "SEEKER_BIND_ADDR", default_value_t = default_bind_addr())]
    pub bind_addr: String,

    /// UDP multicast group the Raft core uses for cluster traffic.
    #[clap(long, env = "SEEKER_RAFT_MULTICAST_ADDR", default_value_t = default_raft_multicast_addr())]
    pub raft_multicast_addr: String,

    /// Cluster name carried on every Raft packet; packets from a
    /// different cluster are dropped silently (spec §4.I).
    #[clap(long, env = "SEEKER_CLUSTER_NAME", default_value_t = default_cluster_name())]
    pub cluster_name: String,

    /// This node's identifier in the Raft membership table.
    #[clap(long, env = "SEEKER_NODE_NAME")]
    pub node_name: String,

    /// `RUST_LOG`-style filter string; falls back to `--log-level` if unset.
    #[clap(long, env = "SEEKER_LOG_LEVEL", default_value_t = default_log_level())]
    pub log_level: String,

    /// Upper bound on the number of cached schema trees kept in memory.
    #[clap(long, env = "SEEKER_SCHEMA_CACHE_SIZE", default_value_t = 256)]
    pub schema_cache_size: usize,
}

impl ManagerOptions {
    pub fn try_build() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}
