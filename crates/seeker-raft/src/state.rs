use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::log::{LogEntry, RaftLog};
use crate::node_table::{NodeEntry, NodeTable};
use crate::wire::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Follower,
    Candidate,
    Leader,
}

#[derive(Debug, Clone, Copy, Default)]
struct PeerProgress {
    next_index: u64,
    match_index: u64,
}

/// Per-node Raft state machine (spec §4.I "Roles and rules").
pub struct RaftState {
    pub node_id: String,
    pub current_term: u64,
    pub voted_for: Option<String>,
    pub log: RaftLog,
    pub commit_index: u64,
    pub last_applied: u64,
    pub role: Role,
    votes_received: HashSet<String>,
    peers: HashMap<String, PeerProgress>,
}

fn majority_of(active: usize) -> usize {
    (active + 1) / 2
}

impl RaftState {
    pub fn new(node_id: impl Into<String>) -> Self {
        RaftState {
            node_id: node_id.into(),
            current_term: 0,
            voted_for: None,
            log: RaftLog::new(),
            commit_index: 0,
            last_applied: 0,
            role: Role::Follower,
            votes_received: HashSet::new(),
            peers: HashMap::new(),
        }
    }

    /// Candidate transition: increments the term, votes for self, and
    /// returns the `RequestVote` packet to broadcast.
    pub fn start_election(&mut self) -> Packet {
        self.current_term += 1;
        self.role = Role::Candidate;
        self.voted_for = Some(self.node_id.clone());
        self.votes_received.clear();
        self.votes_received.insert(self.node_id.clone());
        info!(term = self.current_term, node = %self.node_id, "starting election");
        Packet::RequestVote {
            node: self.node_id.clone(),
            term: self.current_term,
            last_log_term: self.log.last_term(),
            last_log_index: self.log.last_index(),
        }
    }

    fn step_down(&mut self, term: u64) {
        if term > self.current_term {
            self.current_term = term;
            self.voted_for = None;
        }
        self.role = Role::Follower;
        self.votes_received.clear();
    }

    /// Vote granting (spec §4.I "Vote granting").
    pub fn handle_request_vote(
        &mut self,
        candidate: &str,
        term: u64,
        candidate_last_term: u64,
        candidate_last_index: u64,
    ) -> Packet {
        if term > self.current_term {
            self.step_down(term);
        }

        let log_ok = self.log.is_at_least_as_up_to_date(candidate_last_term, candidate_last_index);
        let already_voted_other = matches!(&self.voted_for, Some(v) if v != candidate);
        let granted = term == self.current_term && !already_voted_other && log_ok;

        if granted {
            self.voted_for = Some(candidate.to_string());
        }

        Packet::RequestVoteResponse { node: self.node_id.clone(), term: self.current_term, granted }
    }

    /// Returns `true` if this response made the node a Leader.
    pub fn handle_request_vote_response(&mut self, voter: &str, term: u64, granted: bool, active_count: usize) -> bool {
        if term > self.current_term {
            self.step_down(term);
            return false;
        }
        if self.role != Role::Candidate || term != self.current_term || !granted {
            return false;
        }
        self.votes_received.insert(voter.to_string());
        if self.votes_received.len() >= majority_of(active_count) {
            self.become_leader();
            return true;
        }
        false
    }

    fn become_leader(&mut self) {
        self.role = Role::Leader;
        let next = self.log.last_index() + 1;
        self.peers.clear();
        info!(term = self.current_term, node = %self.node_id, "elected leader");
        let _ = next;
    }

    pub fn register_peer(&mut self, peer: &str) {
        self.peers
            .entry(peer.to_string())
            .or_insert(PeerProgress { next_index: self.log.last_index() + 1, match_index: 0 });
    }

    /// Leader's per-tick decision of what to send `peer` (spec §4.I
    /// "Leader" rule).
    pub fn next_message_for(&self, peer: &str, leader_commit: u64) -> Packet {
        let progress = self.peers.get(peer).copied().unwrap_or_default();
        if progress.next_index <= self.log.last_index() {
            let entry = self.log.get(progress.next_index).cloned();
            let prev_index = progress.next_index.saturating_sub(1);
            Packet::AppendEntries {
                node: self.node_id.clone(),
                term: self.current_term,
                prev_log_index: prev_index,
                prev_log_term: self.log.term_at(prev_index),
                last_log_index: self.log.last_index(),
                entry_term: entry.as_ref().map(|e| e.term).unwrap_or(0),
                entry_cmd: entry.map(|e| e.cmd).unwrap_or_default(),
                leader_commit,
            }
        } else {
            Packet::Heartbeat {
                node: self.node_id.clone(),
                term: self.current_term,
                last_log_index: self.log.last_index(),
                last_log_term: self.log.last_term(),
                leader_commit,
            }
        }
    }

    /// Applies an `AppendEntriesResponse`/`HeartbeatResponse`, updating
    /// `nextIndex`/`matchIndex` on success or backing off on failure.
    pub fn handle_append_response(&mut self, peer: &str, term: u64, success: bool, match_index: Option<u64>) {
        if term > self.current_term {
            self.step_down(term);
            return;
        }
        if self.role != Role::Leader {
            return;
        }
        let progress = self.peers.entry(peer.to_string()).or_default();
        if success {
            if let Some(m) = match_index {
                progress.match_index = m;
                progress.next_index = m + 1;
            }
        } else {
            progress.next_index = progress.next_index.saturating_sub(1).max(1);
        }
    }

    /// Leader-side append: appends `cmd` at the current term to the
    /// local log, to be replicated on the next heartbeat/append tick.
    pub fn propose(&mut self, cmd: String) -> u64 {
        let index = self.log.last_index() + 1;
        self.log.append(LogEntry { term: self.current_term, index, cmd });
        index
    }

    /// Follower-side application of `AppendEntries`/`Heartbeat` (spec
    /// §4.I "Follower" + "Log matching").
    pub fn handle_append_entries(
        &mut self,
        leader: &str,
        term: u64,
        prev_log_index: u64,
        prev_log_term: u64,
        entry: Option<LogEntry>,
        leader_commit: u64,
    ) -> (u64, bool, Option<u64>) {
        if term < self.current_term {
            return (self.current_term, false, None);
        }
        self.step_down(term);
        let _ = leader;

        if !self.log.matches(prev_log_index, prev_log_term) {
            return (self.current_term, false, None);
        }

        if let Some(entry) = entry {
            self.log.truncate_and_append(entry.index, entry);
        }

        if leader_commit > self.commit_index {
            self.commit_index = leader_commit.min(self.log.last_index());
        }

        (self.current_term, true, Some(self.log.last_index()))
    }

    /// Advances `commit_index` to the highest `N` a majority of peers
    /// have replicated in the current term (spec §4.I "Commit").
    pub fn advance_commit_index(&mut self, active_count: usize) {
        if self.role != Role::Leader {
            return;
        }
        let mut candidate = self.commit_index;
        for n in (self.commit_index + 1)..=self.log.last_index() {
            if self.log.term_at(n) != self.current_term {
                continue;
            }
            let acked = 1 + self.peers.values().filter(|p| p.match_index >= n).count();
            if acked >= majority_of(active_count) {
                candidate = n;
            }
        }
        self.commit_index = candidate;
    }

    /// Applies committed-but-not-yet-applied entries to `table`. Apply
    /// is idempotent by construction of [`NodeTable::apply`].
    pub fn apply_committed(&mut self, table: &NodeTable) {
        while self.last_applied < self.commit_index {
            self.last_applied += 1;
            if let Some(entry) = self.log.get(self.last_applied) {
                if let Some(node_entry) = parse_add_node_cmd(&entry.cmd) {
                    debug!(index = self.last_applied, node = %node_entry.name, "applying log entry");
                    table.apply(node_entry);
                }
            }
        }
    }
}

/// Wire format for an `AddCommand` log entry: `idx|name|host|port`.
pub fn format_add_node_cmd(entry: &NodeEntry) -> String {
    format!("{}|{}|{}|{}", entry.idx, entry.name, entry.host, entry.port)
}

fn parse_add_node_cmd(cmd: &str) -> Option<NodeEntry> {
    let mut parts = cmd.splitn(4, '|');
    let idx = parts.next()?.parse().ok()?;
    let name = parts.next()?.to_string();
    let host = parts.next()?.to_string();
    let port = parts.next()?.parse().ok()?;
    Some(NodeEntry { idx, name, host, port })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn election_reaches_leader_with_majority() {
        let mut state = RaftState::new("n1");
        state.start_election();
        assert_eq!(state.role, Role::Candidate);
        let became_leader = state.handle_request_vote_response("n2", state.current_term, true, 3);
        assert!(became_leader);
        assert_eq!(state.role, Role::Leader);
    }

    #[test]
    fn vote_rejected_for_stale_log() {
        let mut follower = RaftState::new("n2");
        follower.log.append(LogEntry { term: 2, index: 1, cmd: "x".into() });
        follower.current_term = 2;
        let resp = follower.handle_request_vote("n1", 2, 1, 0);
        assert!(matches!(resp, Packet::RequestVoteResponse { granted: false, .. }));
    }

    #[test]
    fn append_entries_truncates_conflicting_tail() {
        let mut follower = RaftState::new("n2");
        follower.log.append(LogEntry { term: 1, index: 1, cmd: "a".into() });
        follower.log.append(LogEntry { term: 1, index: 2, cmd: "stale".into() });

        let (_, success, _) = follower.handle_append_entries(
            "n1",
            2,
            1,
            1,
            Some(LogEntry { term: 2, index: 2, cmd: "fresh".into() }),
            0,
        );
        assert!(success);
        assert_eq!(follower.log.get(2).unwrap().cmd, "fresh");
    }

    #[test]
    fn commit_index_advances_on_majority_match() {
        let mut leader = RaftState::new("n1");
        leader.current_term = 1;
        leader.role = Role::Leader;
        leader.log.append(LogEntry { term: 1, index: 1, cmd: "a".into() });
        leader.register_peer("n2");
        leader.register_peer("n3");
        leader.handle_append_response("n2", 1, true, Some(1));
        leader.advance_commit_index(3);
        assert_eq!(leader.commit_index, 1);
    }

    #[test]
    fn apply_committed_updates_node_table() {
        let mut leader = RaftState::new("n1");
        leader.role = Role::Leader;
        leader.current_term = 1;
        let cmd = format_add_node_cmd(&NodeEntry { idx: 7, name: "n7".into(), host: "h".into(), port: 1 });
        leader.propose(cmd);
        leader.commit_index = 1;
        let table = NodeTable::new();
        leader.apply_committed(&table);
        assert_eq!(table.snapshot().get(&7).unwrap().name, "n7");
    }
}
