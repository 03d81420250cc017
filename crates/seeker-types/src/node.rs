use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use time::OffsetDateTime;

/// A cluster member (spec §3 "Node").
///
/// Equality is case-insensitive on `name` plus `address`+ports, matching
/// the source's node comparison (two nodes with differently-cased names
/// on the same host:ports are the same node). `last_touched` is shared
/// through an `Arc` so that cloning a `Node` (e.g. out of the node
/// table) still observes touches recorded by any other clone, mirroring
/// the copy-on-write node table described in spec §5.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub address: String,
    pub http_port: u16,
    pub binary_port: u16,
    last_touched: Arc<AtomicI64>,
}

impl Node {
    pub fn new(name: impl Into<String>, address: impl Into<String>, http_port: u16, binary_port: u16) -> Self {
        Node {
            name: name.into(),
            address: address.into(),
            http_port,
            binary_port,
            last_touched: Arc::new(AtomicI64::new(now_unix_millis())),
        }
    }

    /// Refreshes this node's touched timestamp to "now". Called on
    /// receipt of any message from this node.
    pub fn touch(&self) {
        self.last_touched.store(now_unix_millis(), Ordering::Relaxed);
    }

    pub fn last_touched(&self) -> OffsetDateTime {
        let millis = self.last_touched.load(Ordering::Relaxed);
        OffsetDateTime::from_unix_timestamp(millis / 1000).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    /// A node untouched beyond `threshold` is considered inactive
    /// (spec §3).
    pub fn is_inactive(&self, threshold_secs: i64) -> bool {
        let millis = self.last_touched.load(Ordering::Relaxed);
        now_unix_millis() - millis > threshold_secs * 1000
    }

    /// True if `address` names one of the host's own interface
    /// addresses (or is the literal loopback/host name passed at
    /// startup). The process always has exactly one local node.
    pub fn is_local(&self, local_addresses: &[String]) -> bool {
        local_addresses.iter().any(|a| a.eq_ignore_ascii_case(&self.address))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.address.eq_ignore_ascii_case(&other.address)
            && self.http_port == other.http_port
            && self.binary_port == other.binary_port
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.address.to_ascii_lowercase().hash(state);
        self.http_port.hash(state);
        self.binary_port.hash(state);
    }
}

fn now_unix_millis() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp() * 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_case_insensitive_on_name() {
        let a = Node::new("Node1", "10.0.0.1", 7700, 7701);
        let b = Node::new("node1", "10.0.0.1", 7700, 7701);
        assert_eq!(a, b);
    }

    #[test]
    fn differing_ports_are_different_nodes() {
        let a = Node::new("node1", "10.0.0.1", 7700, 7701);
        let b = Node::new("node1", "10.0.0.1", 7700, 7702);
        assert_ne!(a, b);
    }

    #[test]
    fn is_local_matches_known_interfaces() {
        let n = Node::new("node1", "10.0.0.1", 7700, 7701);
        assert!(n.is_local(&["127.0.0.1".to_string(), "10.0.0.1".to_string()]));
        assert!(!n.is_local(&["192.168.1.1".to_string()]));
    }
}
