/// A single replicated log entry (spec §4.I "Log matching").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub term: u64,
    pub index: u64,
    pub cmd: String,
}

/// The append-only replicated log, 1-indexed to match the spec's
/// `prevLogIndex`/`lastLogIndex` vocabulary; index `0` denotes "empty".
#[derive(Debug, Clone, Default)]
pub struct RaftLog {
    entries: Vec<LogEntry>,
}

impl RaftLog {
    pub fn new() -> Self {
        RaftLog { entries: Vec::new() }
    }

    pub fn last_index(&self) -> u64 {
        self.entries.last().map(|e| e.index).unwrap_or(0)
    }

    pub fn last_term(&self) -> u64 {
        self.entries.last().map(|e| e.term).unwrap_or(0)
    }

    pub fn get(&self, index: u64) -> Option<&LogEntry> {
        if index == 0 {
            return None;
        }
        self.entries.get((index - 1) as usize)
    }

    pub fn term_at(&self, index: u64) -> u64 {
        if index == 0 {
            return 0;
        }
        self.get(index).map(|e| e.term).unwrap_or(0)
    }

    /// Entry `i` matches iff `log[i].term == prev_log_term` and `i <= last_index`
    /// (spec §4.I "Log matching").
    pub fn matches(&self, prev_log_index: u64, prev_log_term: u64) -> bool {
        if prev_log_index == 0 {
            return true;
        }
        prev_log_index <= self.last_index() && self.term_at(prev_log_index) == prev_log_term
    }

    /// Truncates from `index` (inclusive) and appends `entry`, per the
    /// conflict-resolution rule in spec §4.I.
    pub fn truncate_and_append(&mut self, index: u64, entry: LogEntry) {
        self.entries.truncate((index - 1).max(0) as usize);
        self.entries.push(entry);
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn is_at_least_as_up_to_date(&self, candidate_last_term: u64, candidate_last_index: u64) -> bool {
        let (my_term, my_len) = (self.last_term(), self.last_index());
        candidate_last_term > my_term || (candidate_last_term == my_term && candidate_last_index >= my_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_empty_log_at_index_zero() {
        let log = RaftLog::new();
        assert!(log.matches(0, 0));
        assert!(!log.matches(1, 0));
    }

    #[test]
    fn truncate_and_append_drops_conflicting_tail() {
        let mut log = RaftLog::new();
        log.append(LogEntry { term: 1, index: 1, cmd: "a".into() });
        log.append(LogEntry { term: 1, index: 2, cmd: "b".into() });
        log.truncate_and_append(2, LogEntry { term: 2, index: 2, cmd: "c".into() });
        assert_eq!(log.last_index(), 2);
        assert_eq!(log.get(2).unwrap().cmd, "c");
    }

    #[test]
    fn up_to_date_prefers_higher_term_then_longer_log() {
        let mut log = RaftLog::new();
        log.append(LogEntry { term: 1, index: 1, cmd: "a".into() });
        assert!(log.is_at_least_as_up_to_date(2, 0));
        assert!(log.is_at_least_as_up_to_date(1, 1));
        assert!(!log.is_at_least_as_up_to_date(1, 0));
    }
}
