use std::time::Duration;

use seeker_schema::backend::{Document, IndexBackend};
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::frame::{read_frame_header, read_payload, write_frame, FrameKind, FILE_FRAME_TYPE};
use crate::message::{kind_byte, Message, TermOp};

/// Default timeouts (spec §5 "Cancellation & timeouts": "Remote
/// connections have separate idle and active timeouts").
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_ACTIVE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Connection state machine (spec §4.H "State machine per connection").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    InitRemote,
    RemoteServer,
}

/// Drives one binary-protocol connection against a backend `B`. The
/// backend's `DocumentId` is the unique identifying term string, the
/// same overload `ReplaceDocumentTerm`/`DeleteDocumentTerm` address
/// (matching the source's `replace_document`/`delete_document` by
/// unique-term, not by internal docid).
pub struct Connection<B: IndexBackend<DocumentId = String>> {
    state: ConnState,
    backend: B,
    writable: bool,
    files: Vec<NamedTempFile>,
    idle_timeout: Duration,
    active_timeout: Duration,
    connection_started: Instant,
}

impl<B: IndexBackend<DocumentId = String>> Connection<B> {
    pub fn new(backend: B) -> Self {
        Connection {
            state: ConnState::InitRemote,
            backend,
            writable: false,
            files: Vec::new(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            active_timeout: DEFAULT_ACTIVE_TIMEOUT,
            connection_started: Instant::now(),
        }
    }

    fn active_deadline(&self) -> Instant {
        self.connection_started + self.active_timeout
    }

    /// Runs the sequential request/reply loop until the peer sends
    /// `Shutdown`, the connection closes, or a timeout fires. Responses
    /// are emitted strictly in request order (spec §4.H "Ordering and
    /// backpressure"): the loop never starts request `n+1` before
    /// request `n`'s reply has been written.
    pub async fn serve<S: AsyncRead + AsyncWrite + Unpin>(&mut self, stream: &mut S) -> Result<()> {
        let active_deadline = self.active_deadline();
        loop {
            let idle_deadline = Instant::now() + self.idle_timeout;

            let header = tokio::select! {
                biased;
                _ = tokio::time::sleep_until(active_deadline) => {
                    let exception = Message::Exception {
                        error_kind: "Timeout".into(),
                        error_string: "connection active timeout exceeded".into(),
                    };
                    let _ = self.write_message(stream, &exception).await;
                    return Err(ProtocolError::ActiveTimeout);
                }
                _ = tokio::time::sleep_until(idle_deadline) => {
                    return Err(ProtocolError::IdleTimeout);
                }
                header = read_frame_header(stream) => header?,
            };

            match header.kind {
                FrameKind::File => {
                    let tmp = NamedTempFile::new().map_err(ProtocolError::Io)?;
                    let std_file = tmp.as_file().try_clone().map_err(ProtocolError::Io)?;
                    let mut async_file = tokio::fs::File::from_std(std_file);
                    let mut limited = tokio::io::AsyncReadExt::take(&mut *stream, header.length);
                    tokio::io::copy(&mut limited, &mut async_file).await?;
                    self.files.push(tmp);
                    continue;
                }
                FrameKind::Message(_type_byte) => {
                    let payload = read_payload(stream, header.length).await?;
                    let msg = crate::message::decode(&payload)?;
                    if matches!(msg, Message::Shutdown) {
                        debug!("peer requested shutdown");
                        return Ok(());
                    }
                    let reply = self.dispatch(msg);
                    self.write_message(stream, &reply).await?;
                }
            }
        }
    }

    async fn write_message<S: AsyncWrite + Unpin>(&self, stream: &mut S, msg: &Message) -> Result<()> {
        let payload = crate::message::encode(msg)?;
        write_frame(stream, kind_byte(msg), &payload).await?;
        Ok(())
    }

    fn dispatch(&mut self, msg: Message) -> Message {
        if self.state == ConnState::InitRemote {
            match &msg {
                Message::ReadAccess | Message::WriteAccess => self.state = ConnState::RemoteServer,
                _ => {
                    return Message::Exception {
                        error_kind: "ClientError".into(),
                        error_string: "first message must be ReadAccess or WriteAccess".into(),
                    }
                }
            }
        }

        match msg {
            Message::WriteAccess => {
                if self.writable {
                    Message::Exception { error_kind: "AlreadyLocked".into(), error_string: "endpoint already writable on this connection".into() }
                } else {
                    self.writable = true;
                    Message::Update { revision: self.backend.revision() }
                }
            }
            Message::ReadAccess => Message::Update { revision: self.backend.revision() },
            Message::Reopen => Message::Update { revision: self.backend.revision() },

            Message::AddDocument { ops } => {
                let mut doc = self.backend.new_document();
                apply_ops(&mut doc, ops);
                match self.backend.add_document(doc) {
                    Ok(doc_id) => Message::AddDocumentReply { doc_id },
                    Err(err) => backend_exception(&err),
                }
            }
            Message::ReplaceDocumentTerm { term, ops } => {
                let mut doc = self.backend.new_document();
                apply_ops(&mut doc, ops);
                match self.backend.replace_document(&term, doc) {
                    Ok(()) => Message::AddDocumentReply { doc_id: term },
                    Err(err) => backend_exception(&err),
                }
            }
            Message::DeleteDocumentTerm { term } => match self.backend.delete_document(&term) {
                Ok(()) => Message::Done,
                Err(err) => backend_exception(&err),
            },
            Message::Commit => match self.backend.commit() {
                Ok(()) => Message::Done,
                Err(err) => backend_exception(&err),
            },
            Message::GetMetadata { key } => match self.backend.get_metadata(&key) {
                Ok(Some(value)) => Message::Metadata { value },
                Ok(None) => Message::Metadata { value: Vec::new() },
                Err(err) => backend_exception(&err),
            },
            Message::SetMetadata { key, value } => match self.backend.set_metadata(&key, &value) {
                Ok(()) => Message::Done,
                Err(err) => backend_exception(&err),
            },

            Message::AllTerms { .. } | Message::Query { .. } | Message::GetMSet { .. } | Message::TermExists { .. } | Message::Document { .. } => {
                Message::Exception {
                    error_kind: "BackendError".into(),
                    error_string: "search execution is outside the index-backend contract".into(),
                }
            }

            other => {
                warn!(?other, "unexpected message in this connection state");
                Message::Exception { error_kind: "ClientError".into(), error_string: "unexpected message".into() }
            }
        }
    }

    /// On connection close, any in-progress write must be rolled back
    /// via `cancel()` before the handle is checked in (spec §4.H
    /// "Cancellation").
    pub fn abandon(&mut self) {
        if self.writable {
            if let Err(err) = self.backend.cancel() {
                warn!(%err, "cancel on connection abandon failed");
            }
        }
    }
}

fn apply_ops<D: Document>(doc: &mut D, ops: Vec<TermOp>) {
    for op in ops {
        match op {
            TermOp::Term { prefix, term, position, weight } => doc.add_term(&prefix, &term, position, weight),
            TermOp::BooleanTerm { prefix, term } => doc.add_boolean_term(&prefix, &term),
            TermOp::Value { slot, value } => doc.add_value(slot, &value),
        }
    }
}

fn backend_exception<E: std::fmt::Display>(err: &E) -> Message {
    Message::Exception { error_kind: "BackendError".into(), error_string: err.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeDocument {
        values: BTreeMap<u32, Vec<u8>>,
    }

    impl Document for FakeDocument {
        fn add_term(&mut self, _prefix: &str, _term: &[u8], _position: Option<u32>, _weight: u32) {}
        fn add_boolean_term(&mut self, _prefix: &str, _term: &[u8]) {}
        fn add_value(&mut self, slot: u32, value: &[u8]) {
            self.values.insert(slot, value.to_vec());
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        revision: u64,
        metadata: BTreeMap<String, Vec<u8>>,
    }

    impl IndexBackend for FakeBackend {
        type DocumentId = String;
        type Document = FakeDocument;
        type Error = std::io::Error;

        fn new_document(&mut self) -> Self::Document {
            FakeDocument::default()
        }
        fn add_document(&mut self, _doc: Self::Document) -> std::result::Result<Self::DocumentId, Self::Error> {
            Ok("Qnew".to_string())
        }
        fn replace_document(&mut self, _id: &Self::DocumentId, _doc: Self::Document) -> std::result::Result<(), Self::Error> {
            Ok(())
        }
        fn delete_document(&mut self, _id: &Self::DocumentId) -> std::result::Result<(), Self::Error> {
            Ok(())
        }
        fn cancel(&mut self) -> std::result::Result<(), Self::Error> {
            Ok(())
        }
        fn commit(&mut self) -> std::result::Result<(), Self::Error> {
            self.revision += 1;
            Ok(())
        }
        fn recover_index(&mut self) -> std::result::Result<(), Self::Error> {
            Ok(())
        }
        fn get_metadata(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, Self::Error> {
            Ok(self.metadata.get(key).cloned())
        }
        fn set_metadata(&mut self, key: &str, value: &[u8]) -> std::result::Result<(), Self::Error> {
            self.metadata.insert(key.to_string(), value.to_vec());
            Ok(())
        }
        fn uuid(&self) -> Uuid {
            Uuid::nil()
        }
        fn revision(&self) -> u64 {
            self.revision
        }
    }

    #[test]
    fn write_access_twice_is_already_locked() {
        let mut conn = Connection::new(FakeBackend::default());
        conn.state = ConnState::RemoteServer;
        let first = conn.dispatch(Message::WriteAccess);
        assert!(matches!(first, Message::Update { .. }));
        let second = conn.dispatch(Message::WriteAccess);
        assert!(matches!(second, Message::Exception { error_kind, .. } if error_kind == "AlreadyLocked"));
    }

    #[test]
    fn add_document_replays_ops_and_replies() {
        let mut conn = Connection::new(FakeBackend::default());
        conn.state = ConnState::RemoteServer;
        let reply = conn.dispatch(Message::AddDocument { ops: vec![TermOp::Value { slot: 1, value: vec![9] }] });
        assert!(matches!(reply, Message::AddDocumentReply { doc_id } if doc_id == "Qnew"));
    }

    #[test]
    fn query_is_rejected_as_out_of_scope() {
        let mut conn = Connection::new(FakeBackend::default());
        conn.state = ConnState::RemoteServer;
        let reply = conn.dispatch(Message::Query { query: "x".into(), offset: 0, limit: 10 });
        assert!(matches!(reply, Message::Exception { .. }));
    }
}
