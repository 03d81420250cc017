use std::path::{Path, PathBuf};
use std::sync::Arc;

use seeker_raft::NodeTable;
use seeker_types::Endpoint;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::error::{ProtocolError, Result};
use crate::frame::{read_frame_header, read_payload, write_frame, FrameKind};
use crate::message::{decode, encode, kind_byte, Message};

const IAMGLASS_MARKER: &str = "iamglass";

/// Decision reached before opening a connection (spec §4.J steps 1-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoOpLocalSource,
    NoOpAlreadyCurrent,
    Declined,
    Proceed,
}

/// Drives `trigger_replication(src, dst)` (spec §4.J).
pub struct ReplicationDriver {
    table: Arc<NodeTable>,
    local_node: String,
}

impl ReplicationDriver {
    pub fn new(table: Arc<NodeTable>, local_node: impl Into<String>) -> Self {
        ReplicationDriver { table, local_node: local_node.into() }
    }

    fn iamglass_marker(dst_dir: &Path) -> PathBuf {
        dst_dir.join(IAMGLASS_MARKER)
    }

    pub fn decide(&self, src: &Endpoint, dst_dir: &Path) -> Decision {
        if src.is_local(&[self.local_node.clone()]) {
            return Decision::NoOpLocalSource;
        }
        if Self::iamglass_marker(dst_dir).exists() {
            return Decision::NoOpAlreadyCurrent;
        }
        let owns_source = self
            .table
            .snapshot()
            .values()
            .any(|n| n.name == self.local_node && src.host == n.host);
        if !owns_source {
            return Decision::Declined;
        }
        Decision::Proceed
    }

    /// Streams changesets from an already-connected `conn` into
    /// `scratch_path`, then atomically renames it into `dst_dir`
    /// (spec §4.J step 4). The rename is the "atomic swap"; partial
    /// failure mid-stream leaves `dst_dir` untouched.
    pub async fn pull_changesets<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        conn: &mut S,
        local_rev: u64,
        scratch_path: &Path,
        dst_dir: &Path,
    ) -> Result<()> {
        let request = Message::GetChangesets { start_rev: local_rev, end_rev: 0 };
        let payload = encode(&request)?;
        write_frame(conn, kind_byte(&request), &payload).await?;

        let mut scratch = tokio::fs::File::create(scratch_path).await.map_err(ProtocolError::Io)?;

        loop {
            let header = read_frame_header(conn).await?;
            let FrameKind::Message(_) = header.kind else {
                return Err(ProtocolError::Malformed("unexpected file frame during replication".into()));
            };
            let payload = read_payload(conn, header.length).await?;
            match decode(&payload)? {
                Message::Changeset { data } => {
                    use tokio::io::AsyncWriteExt;
                    scratch.write_all(&data).await.map_err(ProtocolError::Io)?;
                }
                Message::Done => break,
                Message::Exception { error_kind, error_string } => {
                    let _ = tokio::fs::remove_file(scratch_path).await;
                    return Err(ProtocolError::ReplicationFailed(format!("{error_kind}: {error_string}")));
                }
                other => {
                    let _ = tokio::fs::remove_file(scratch_path).await;
                    return Err(ProtocolError::Malformed(format!("unexpected reply during replication: {other:?}")));
                }
            }
        }

        tokio::fs::create_dir_all(dst_dir).await.map_err(ProtocolError::Io)?;
        let target = dst_dir.join("data");
        tokio::fs::rename(scratch_path, &target).await.map_err(ProtocolError::Io)?;
        tokio::fs::write(Self::iamglass_marker(dst_dir), b"1").await.map_err(ProtocolError::Io)?;
        info!(dst = %dst_dir.display(), "replication completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_raft::NodeEntry;

    #[test]
    fn declines_when_local_node_does_not_own_source() {
        let table = Arc::new(NodeTable::new());
        table.apply(NodeEntry { idx: 1, name: "other".into(), host: "10.0.0.2".into(), port: 9000 });
        let driver = ReplicationDriver::new(table, "self-node");

        let src = Endpoint::parse("http://10.0.0.9/db", ".");
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(driver.decide(&src, dir.path()), Decision::Declined);
    }

    #[test]
    fn no_op_when_marker_already_present() {
        let table = Arc::new(NodeTable::new());
        let driver = ReplicationDriver::new(table, "self-node");
        let src = Endpoint::parse("http://10.0.0.9/db", ".");
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(IAMGLASS_MARKER), b"1").unwrap();
        assert_eq!(driver.decide(&src, dir.path()), Decision::NoOpAlreadyCurrent);
    }
}
