//! Raft consensus core (spec §4.I) and its UDP wire format (spec §6).

pub mod error;
pub mod log;
pub mod node_table;
pub mod state;
pub mod timers;
pub mod transport;
pub mod wire;

pub use crate::state::{Role, RaftState};
pub use error::{RaftError, Result};
pub use log::{LogEntry, RaftLog};
pub use node_table::{NodeEntry, NodeTable};
pub use transport::RaftDriver;
pub use wire::Packet;
