use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// A single accumulation call against the backend's `Document` trait
/// (`seeker_schema::backend::Document`), serialized so a built document
/// can cross the wire without assuming anything about the backend's
/// internal representation (spec §1 "the underlying inverted-index
/// library" stays a black box).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TermOp {
    Term { prefix: String, term: Vec<u8>, position: Option<u32>, weight: u32 },
    BooleanTerm { prefix: String, term: Vec<u8> },
    Value { slot: u32, value: Vec<u8> },
}

/// Request/reply payloads (spec §4.H "Message table"). The frame's
/// `type:u8` is carried independently for fast dispatch; the payload
/// itself stays self-describing so a mismatch between the two is
/// detectable rather than silently trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    AllTerms { prefix: String },
    AllTermsReply { term: String },
    Done,
    Document { term_id: u64 },
    DocData { data: Vec<u8> },
    TermExists { term: String },
    TermExistsReply { exists: bool },
    Query { query: String, offset: u32, limit: u32 },
    Stats { matches_estimated: u64 },
    GetMSet { query: String, offset: u32, limit: u32 },
    Results { doc_ids: Vec<u64> },
    AddDocument { ops: Vec<TermOp> },
    AddDocumentReply { doc_id: String },
    DeleteDocumentTerm { term: String },
    ReplaceDocumentTerm { term: String, ops: Vec<TermOp> },
    Commit,
    GetMetadata { key: String },
    Metadata { value: Vec<u8> },
    SetMetadata { key: String, value: Vec<u8> },
    WriteAccess,
    ReadAccess,
    Reopen,
    Update { revision: u64 },
    Shutdown,
    Exception { error_kind: String, error_string: String },
    GetChangesets { start_rev: u64, end_rev: u64 },
    Changeset { data: Vec<u8> },
}

pub fn kind_byte(msg: &Message) -> u8 {
    match msg {
        Message::AllTerms { .. } => 1,
        Message::AllTermsReply { .. } => 2,
        Message::Done => 3,
        Message::Document { .. } => 4,
        Message::DocData { .. } => 5,
        Message::TermExists { .. } => 6,
        Message::TermExistsReply { .. } => 7,
        Message::Query { .. } => 8,
        Message::Stats { .. } => 9,
        Message::GetMSet { .. } => 10,
        Message::Results { .. } => 11,
        Message::AddDocument { .. } => 12,
        Message::AddDocumentReply { .. } => 13,
        Message::DeleteDocumentTerm { .. } => 14,
        Message::ReplaceDocumentTerm { .. } => 15,
        Message::Commit => 16,
        Message::GetMetadata { .. } => 17,
        Message::Metadata { .. } => 18,
        Message::SetMetadata { .. } => 19,
        Message::WriteAccess => 20,
        Message::ReadAccess => 21,
        Message::Reopen => 22,
        Message::Update { .. } => 23,
        Message::Shutdown => 24,
        Message::Exception { .. } => 25,
        Message::GetChangesets { .. } => 26,
        Message::Changeset { .. } => 27,
    }
}

pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    rmp_serde::to_vec(msg).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

pub fn decode(payload: &[u8]) -> Result<Message> {
    rmp_serde::from_slice(payload).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_add_document() {
        let msg = Message::AddDocument { ops: vec![TermOp::Value { slot: 1, value: vec![1, 2, 3] }] };
        let bytes = encode(&msg).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert!(matches!(decoded, Message::AddDocument { ops } if ops.len() == 1));
    }

    #[test]
    fn kind_byte_is_stable_per_variant() {
        assert_eq!(kind_byte(&Message::Commit), kind_byte(&Message::Commit));
        assert_ne!(kind_byte(&Message::Commit), kind_byte(&Message::Shutdown));
    }
}
