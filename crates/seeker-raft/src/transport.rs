use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::state::{RaftState, Role};
use crate::node_table::NodeTable;
use crate::timers::{election_timeout, heartbeat_interval};
use crate::wire::{decode, encode, Packet};

const MAX_DATAGRAM: usize = 64 * 1024;

/// Drives a single node's Raft state machine over a UDP multicast
/// socket: election timer, heartbeat ticks, and inbound packet
/// handling, mirroring the teacher's `tokio::select!`-driven background
/// loops (`meilisearch::search_queue::SearchQueue::run`).
pub struct RaftDriver {
    socket: UdpSocket,
    multicast_addr: SocketAddr,
    cluster_name: String,
    state: Arc<Mutex<RaftState>>,
    table: Arc<NodeTable>,
}

impl RaftDriver {
    pub fn new(
        socket: UdpSocket,
        multicast_addr: SocketAddr,
        cluster_name: impl Into<String>,
        state: Arc<Mutex<RaftState>>,
        table: Arc<NodeTable>,
    ) -> Self {
        RaftDriver { socket, multicast_addr, cluster_name: cluster_name.into(), state, table }
    }

    async fn broadcast(&self, packet: &Packet) {
        let bytes = encode(&self.cluster_name, packet);
        if let Err(err) = self.socket.send_to(&bytes, self.multicast_addr).await {
            warn!(%err, "failed to send raft packet");
        }
    }

    /// Runs the election-timer / heartbeat-timer / inbound-packet loop
    /// until cancelled.
    pub async fn run(&self, cancel: tokio::sync::watch::Receiver<bool>) {
        let mut cancel = cancel;
        let mut election_deadline = Instant::now() + election_timeout();
        let mut heartbeat = interval_at(Instant::now() + heartbeat_interval(), heartbeat_interval());
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                biased;

                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        debug!("raft driver cancelled");
                        return;
                    }
                }

                _ = tokio::time::sleep_until(election_deadline) => {
                    let is_leader = matches!(self.state.lock().role, Role::Leader);
                    if !is_leader {
                        let packet = self.state.lock().start_election();
                        self.broadcast(&packet).await;
                    }
                    election_deadline = Instant::now() + election_timeout();
                }

                _ = heartbeat.tick() => {
                    let (is_leader, term) = {
                        let state = self.state.lock();
                        (state.role == Role::Leader, state.current_term)
                    };
                    if is_leader {
                        let commit = self.state.lock().commit_index;
                        for peer in self.table.snapshot().values() {
                            if peer.name == self.state.lock().node_id {
                                continue;
                            }
                            let packet = self.state.lock().next_message_for(&peer.name, commit);
                            self.broadcast(&packet).await;
                        }
                    }
                    let _ = term;
                }

                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((n, _from)) => self.handle_datagram(&buf[..n], &mut election_deadline).await,
                        Err(err) => warn!(%err, "udp recv error"),
                    }
                }
            }
        }
    }

    async fn handle_datagram(&self, datagram: &[u8], election_deadline: &mut Instant) {
        let packet = match decode(&self.cluster_name, datagram) {
            Ok(Some(packet)) => packet,
            Ok(None) => return,
            Err(err) => {
                warn!(%err, "malformed raft packet");
                return;
            }
        };

        let active_count = self.table.active_count().max(1);
        let mut state = self.state.lock();
        match packet {
            Packet::RequestVote { node, term, last_log_term, last_log_index } => {
                let response = state.handle_request_vote(&node, term, last_log_term, last_log_index);
                drop(state);
                self.broadcast(&response).await;
            }
            Packet::RequestVoteResponse { node, term, granted } => {
                if state.handle_request_vote_response(&node, term, granted, active_count) {
                    *election_deadline = Instant::now() + election_timeout();
                }
            }
            Packet::AppendEntries { node, term, prev_log_index, prev_log_term, entry_term, entry_cmd, leader_commit, .. } => {
                let entry = if entry_cmd.is_empty() {
                    None
                } else {
                    Some(crate::log::LogEntry { term: entry_term, index: prev_log_index + 1, cmd: entry_cmd })
                };
                let (resp_term, success, match_index) =
                    state.handle_append_entries(&node, term, prev_log_index, prev_log_term, entry, leader_commit);
                let node_id = state.node_id.clone();
                drop(state);
                *election_deadline = Instant::now() + election_timeout();
                self.broadcast(&Packet::AppendEntriesResponse {
                    node: node_id,
                    term: resp_term,
                    success,
                    next_index: match_index.map(|m| m + 1),
                    match_index,
                })
                .await;
            }
            Packet::Heartbeat { node, term, last_log_index: _, last_log_term: _, leader_commit } => {
                let (resp_term, success, match_index) =
                    state.handle_append_entries(&node, term, state.log.last_index(), state.log.last_term(), None, leader_commit);
                let node_id = state.node_id.clone();
                drop(state);
                *election_deadline = Instant::now() + election_timeout();
                self.broadcast(&Packet::HeartbeatResponse {
                    node: node_id,
                    term: resp_term,
                    success,
                    next_index: match_index.map(|m| m + 1),
                    match_index,
                })
                .await;
            }
            Packet::AppendEntriesResponse { node, term, success, match_index, .. }
            | Packet::HeartbeatResponse { node, term, success, match_index, .. } => {
                state.handle_append_response(&node, term, success, match_index);
                state.advance_commit_index(active_count);
                state.apply_committed(&self.table);
            }
            Packet::AddCommand { cmd, .. } => {
                if state.role == Role::Leader {
                    state.propose(cmd);
                }
            }
        }
    }
}
