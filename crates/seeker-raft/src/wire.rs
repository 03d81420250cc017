use byteorder::{BigEndian, ByteOrder};

use crate::error::{RaftError, Result};

pub const CURRENT_MAJOR: u8 = 1;
pub const CURRENT_MINOR: u8 = 0;

/// UDP Raft packet kinds (spec §6 "Wire — UDP Raft packets").
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    RequestVote { node: String, term: u64, last_log_term: u64, last_log_index: u64 },
    RequestVoteResponse { node: String, term: u64, granted: bool },
    AppendEntries {
        node: String,
        term: u64,
        prev_log_index: u64,
        prev_log_term: u64,
        last_log_index: u64,
        entry_term: u64,
        entry_cmd: String,
        leader_commit: u64,
    },
    Heartbeat { node: String, term: u64, last_log_index: u64, last_log_term: u64, leader_commit: u64 },
    AppendEntriesResponse { node: String, term: u64, success: bool, next_index: Option<u64>, match_index: Option<u64> },
    HeartbeatResponse { node: String, term: u64, success: bool, next_index: Option<u64>, match_index: Option<u64> },
    AddCommand { node: String, cmd: String },
}

fn kind_byte(packet: &Packet) -> u8 {
    match packet {
        Packet::RequestVote { .. } => 1,
        Packet::RequestVoteResponse { .. } => 2,
        Packet::AppendEntries { .. } => 3,
        Packet::Heartbeat { .. } => 4,
        Packet::AppendEntriesResponse { .. } => 5,
        Packet::HeartbeatResponse { .. } => 6,
        Packet::AddCommand { .. } => 7,
    }
}

fn write_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    let mut len = [0u8; 4];
    BigEndian::write_u32(&mut len, bytes.len() as u32);
    buf.extend_from_slice(&len);
    buf.extend_from_slice(bytes);
}

fn write_u64_field(buf: &mut Vec<u8>, v: u64) {
    let mut be = [0u8; 8];
    BigEndian::write_u64(&mut be, v);
    write_field(buf, &be);
}

fn write_bool_field(buf: &mut Vec<u8>, v: bool) {
    write_field(buf, &[v as u8]);
}

fn write_str_field(buf: &mut Vec<u8>, v: &str) {
    write_field(buf, v.as_bytes());
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn field(&mut self) -> Result<&'a [u8]> {
        if self.pos + 4 > self.buf.len() {
            return Err(RaftError::MalformedPacket("truncated length prefix".into()));
        }
        let len = BigEndian::read_u32(&self.buf[self.pos..self.pos + 4]) as usize;
        self.pos += 4;
        if self.pos + len > self.buf.len() {
            return Err(RaftError::MalformedPacket("truncated field".into()));
        }
        let field = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(field)
    }

    fn u64_field(&mut self) -> Result<u64> {
        let field = self.field()?;
        if field.len() != 8 {
            return Err(RaftError::MalformedPacket("expected 8-byte integer field".into()));
        }
        Ok(BigEndian::read_u64(field))
    }

    fn bool_field(&mut self) -> Result<bool> {
        let field = self.field()?;
        Ok(field.first().copied().unwrap_or(0) != 0)
    }

    fn str_field(&mut self) -> Result<String> {
        let field = self.field()?;
        String::from_utf8(field.to_vec()).map_err(|e| RaftError::MalformedPacket(e.to_string()))
    }
}

/// Serializes `packet`, prefixed with the version and `cluster_name`.
pub fn encode(cluster_name: &str, packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.push(CURRENT_MAJOR);
    buf.push(CURRENT_MINOR);
    buf.push(kind_byte(packet));
    write_str_field(&mut buf, cluster_name);

    match packet {
        Packet::RequestVote { node, term, last_log_term, last_log_index } => {
            write_str_field(&mut buf, node);
            write_u64_field(&mut buf, *term);
            write_u64_field(&mut buf, *last_log_term);
            write_u64_field(&mut buf, *last_log_index);
        }
        Packet::RequestVoteResponse { node, term, granted } => {
            write_str_field(&mut buf, node);
            write_u64_field(&mut buf, *term);
            write_bool_field(&mut buf, *granted);
        }
        Packet::AppendEntries {
            node,
            term,
            prev_log_index,
            prev_log_term,
            last_log_index,
            entry_term,
            entry_cmd,
            leader_commit,
        } => {
            write_str_field(&mut buf, node);
            write_u64_field(&mut buf, *term);
            write_u64_field(&mut buf, *prev_log_index);
            write_u64_field(&mut buf, *prev_log_term);
            write_u64_field(&mut buf, *last_log_index);
            write_u64_field(&mut buf, *entry_term);
            write_str_field(&mut buf, entry_cmd);
            write_u64_field(&mut buf, *leader_commit);
        }
        Packet::Heartbeat { node, term, last_log_index, last_log_term, leader_commit } => {
            write_str_field(&mut buf, node);
            write_u64_field(&mut buf, *term);
            write_u64_field(&mut buf, *last_log_index);
            write_u64_field(&mut buf, *last_log_term);
            write_u64_field(&mut buf, *leader_commit);
        }
        Packet::AppendEntriesResponse { node, term, success, next_index, match_index }
        | Packet::HeartbeatResponse { node, term, success, next_index, match_index } => {
            write_str_field(&mut buf, node);
            write_u64_field(&mut buf, *term);
            write_bool_field(&mut buf, *success);
            if *success {
                write_u64_field(&mut buf, next_index.unwrap_or(0));
                write_u64_field(&mut buf, match_index.unwrap_or(0));
            }
        }
        Packet::AddCommand { node, cmd } => {
            write_str_field(&mut buf, node);
            write_str_field(&mut buf, cmd);
        }
    }
    buf
}

/// Decodes a packet, returning `Ok(None)` when the cluster name doesn't
/// match `expected_cluster` — a foreign/misconfigured peer's packet is
/// dropped silently rather than surfaced as a protocol error (spec
/// §4.I transport note; `server/udp.cc`'s behavior, per `SPEC_FULL.md`
/// item 3).
pub fn decode(expected_cluster: &str, buf: &[u8]) -> Result<Option<Packet>> {
    if buf.len() < 3 {
        return Err(RaftError::MalformedPacket("packet too short".into()));
    }
    let major = buf[0];
    let minor = buf[1];
    let kind = buf[2];
    if major != CURRENT_MAJOR {
        return Err(RaftError::UnsupportedVersion(major));
    }
    let _ = minor;

    let mut reader = Reader::new(&buf[3..]);
    let cluster_name = reader.str_field()?;
    if cluster_name != expected_cluster {
        return Ok(None);
    }

    let packet = match kind {
        1 => Packet::RequestVote {
            node: reader.str_field()?,
            term: reader.u64_field()?,
            last_log_term: reader.u64_field()?,
            last_log_index: reader.u64_field()?,
        },
        2 => Packet::RequestVoteResponse {
            node: reader.str_field()?,
            term: reader.u64_field()?,
            granted: reader.bool_field()?,
        },
        3 => Packet::AppendEntries {
            node: reader.str_field()?,
            term: reader.u64_field()?,
            prev_log_index: reader.u64_field()?,
            prev_log_term: reader.u64_field()?,
            last_log_index: reader.u64_field()?,
            entry_term: reader.u64_field()?,
            entry_cmd: reader.str_field()?,
            leader_commit: reader.u64_field()?,
        },
        4 => Packet::Heartbeat {
            node: reader.str_field()?,
            term: reader.u64_field()?,
            last_log_index: reader.u64_field()?,
            last_log_term: reader.u64_field()?,
            leader_commit: reader.u64_field()?,
        },
        5 | 6 => {
            let node = reader.str_field()?;
            let term = reader.u64_field()?;
            let success = reader.bool_field()?;
            let (next_index, match_index) = if success {
                (Some(reader.u64_field()?), Some(reader.u64_field()?))
            } else {
                (None, None)
            };
            if kind == 5 {
                Packet::AppendEntriesResponse { node, term, success, next_index, match_index }
            } else {
                Packet::HeartbeatResponse { node, term, success, next_index, match_index }
            }
        }
        7 => Packet::AddCommand { node: reader.str_field()?, cmd: reader.str_field()? },
        other => return Err(RaftError::MalformedPacket(format!("unknown packet kind {other}"))),
    };
    Ok(Some(packet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_request_vote() {
        let packet = Packet::RequestVote { node: "n1".into(), term: 5, last_log_term: 4, last_log_index: 10 };
        let encoded = encode("cluster-a", &packet);
        let decoded = decode("cluster-a", &encoded).unwrap().unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn mismatched_cluster_name_drops_silently() {
        let packet = Packet::AddCommand { node: "n1".into(), cmd: "noop".into() };
        let encoded = encode("cluster-a", &packet);
        let decoded = decode("cluster-b", &encoded).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn round_trips_append_entries_response_on_failure() {
        let packet = Packet::AppendEntriesResponse {
            node: "n2".into(),
            term: 3,
            success: false,
            next_index: None,
            match_index: None,
        };
        let encoded = encode("c", &packet);
        let decoded = decode("c", &encoded).unwrap().unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn unsupported_major_version_is_rejected() {
        let mut buf = encode("c", &Packet::AddCommand { node: "n".into(), cmd: "x".into() });
        buf[0] = CURRENT_MAJOR + 1;
        let err = decode("c", &buf).unwrap_err();
        assert!(matches!(err, RaftError::UnsupportedVersion(_)));
    }
}
