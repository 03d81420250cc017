//! Remote binary protocol (spec §4.H) and the replication driver
//! (spec §4.J): framed messages over TCP, the `InitRemote`/`RemoteServer`
//! connection state machine, and changeset streaming.

pub mod connection;
pub mod error;
pub mod frame;
pub mod message;
pub mod replication;
pub mod varint;

pub use connection::{Connection, ConnState};
pub use error::{ProtocolError, Result};
pub use message::{Message, TermOp};
pub use replication::{Decision, ReplicationDriver};
