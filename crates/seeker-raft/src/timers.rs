use std::time::Duration;

use rand::Rng;

/// `HB_MAX` from spec §4.I; the heartbeat interval and election timeout
/// are both derived from it.
pub const HB_MAX_MS: u64 = 300;
pub const LEADER_ELECTION_MAX_MS: u64 = 1500;

/// Uniform in `[2.5*HB_MAX, 5*HB_MAX]`.
pub fn election_timeout() -> Duration {
    let lo = (2.5 * HB_MAX_MS as f64) as u64;
    let hi = 5 * HB_MAX_MS;
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

/// Uniform in `[150ms, 300ms]`.
pub fn heartbeat_interval() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(150..=300))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn election_timeout_within_bounds() {
        for _ in 0..100 {
            let d = election_timeout();
            assert!(d.as_millis() >= 750 && d.as_millis() <= 1500);
        }
    }

    #[test]
    fn heartbeat_within_bounds() {
        for _ in 0..100 {
            let d = heartbeat_interval();
            assert!(d.as_millis() >= 150 && d.as_millis() <= 300);
        }
    }
}
