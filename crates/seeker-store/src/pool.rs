use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use seeker_types::Endpoints;
use tracing::{debug, warn};

use crate::error::{CheckoutError, Result};
use crate::flags::CheckoutFlags;
use crate::handle::Handle;
use crate::mastery;

/// Checkout retries before a concurrent-modification failure is
/// surfaced to the caller (spec §3 "Database handle", retry budget).
pub const DB_RETRIES: u32 = 3;

const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_SWEEP_AGE: Duration = Duration::from_secs(60);

struct EndpointState {
    db_dir: PathBuf,
    writer_out: bool,
    readers: usize,
    mastery_level: u64,
    revision: u64,
    last_used: Instant,
}

impl EndpointState {
    fn idle(&self) -> bool {
        !self.writer_out && self.readers == 0
    }
}

/// Keeps at most one writable [`Handle`] per local endpoint set alive
/// at a time, with any number of concurrent readers, modeled after the
/// teacher's generation-tracked `IndexMap` (`index-scheduler/src/index_mapper/index_map.rs`):
/// a single map guarded by a lock, plus a condvar writers block on
/// instead of busy-polling.
pub struct Pool {
    states: Mutex<HashMap<u64, EndpointState>>,
    released: Condvar,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Pool {
            states: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }

    /// Checks out `endpoints` under `flags`, resolving the on-disk
    /// database directory at `db_dir`. Blocks (bounded by
    /// [`CHECKOUT_TIMEOUT`]) when a writable handle is requested while
    /// one is already outstanding; exceeding the bound is surfaced as
    /// [`CheckoutError::AlreadyLocked`] rather than as a programmer
    /// error, since contention here is an expected runtime condition.
    pub fn checkout(&self, endpoints: &Endpoints, flags: CheckoutFlags, db_dir: &Path) -> Result<Handle> {
        let key = endpoints.hash();
        let mut states = self.states.lock();

        if flags.is_writable() {
            let deadline = Instant::now() + CHECKOUT_TIMEOUT;
            while states.get(&key).is_some_and(|s| s.writer_out) {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(CheckoutError::AlreadyLocked);
                }
                let timed_out = self.released.wait_for(&mut states, remaining).timed_out();
                if timed_out {
                    return Err(CheckoutError::AlreadyLocked);
                }
            }
        }

        let mastery_level = mastery::read_or_init(db_dir)?;
        let entry = states.entry(key).or_insert_with(|| EndpointState {
            db_dir: db_dir.to_path_buf(),
            writer_out: false,
            readers: 0,
            mastery_level,
            revision: 0,
            last_used: Instant::now(),
        });

        if flags.is_writable() {
            entry.writer_out = true;
        } else {
            entry.readers += 1;
        }
        entry.last_used = Instant::now();

        debug!(endpoints = key, writable = flags.is_writable(), "checked out database handle");

        Ok(Handle {
            endpoints: endpoints.clone(),
            flags,
            mastery_level: entry.mastery_level,
            revision: entry.revision,
            key,
        })
    }

    /// Releases a previously checked-out handle. If it was the
    /// writable handle, bumps the mastery marker on the first write
    /// the handle actually performed and wakes any blocked writers.
    pub fn checkin(&self, handle: &Handle, wrote: bool) -> Result<()> {
        let mut states = self.states.lock();
        let Some(entry) = states.get_mut(&handle.key) else {
            warn!(endpoints = handle.key, "checkin for unknown endpoint state");
            return Ok(());
        };

        if handle.is_writable() {
            if wrote {
                entry.mastery_level = mastery::bump(&entry.db_dir, entry.mastery_level)?;
                entry.revision += 1;
            }
            entry.writer_out = false;
        } else {
            entry.readers = entry.readers.saturating_sub(1);
        }
        entry.last_used = Instant::now();

        self.released.notify_all();
        Ok(())
    }

    /// Forces any outstanding writable handle closed and clears local
    /// state for `endpoints`, re-reading the mastery marker from disk
    /// on the next checkout (spec §3: "recover_database" path after a
    /// detected corruption or a forced takeover).
    pub fn recover_database(&self, endpoints: &Endpoints) {
        let key = endpoints.hash();
        let mut states = self.states.lock();
        states.remove(&key);
        self.released.notify_all();
    }

    /// Drops idle endpoint state older than [`IDLE_SWEEP_AGE`],
    /// mirroring the teacher's periodic `ClosingIndex` reap.
    pub fn cleanup(&self) {
        let mut states = self.states.lock();
        let now = Instant::now();
        states.retain(|_, state| !state.idle() || now.duration_since(state.last_used) < IDLE_SWEEP_AGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_types::Endpoint;

    fn endpoints_of(path: &str) -> Endpoints {
        let mut e = Endpoints::new();
        e.insert(Endpoint::parse(path, "."));
        e
    }

    #[test]
    fn reader_checkout_does_not_block_other_readers() {
        let pool = Pool::new();
        let dir = tempfile::tempdir().unwrap();
        let endpoints = endpoints_of("db1");

        let h1 = pool.checkout(&endpoints, CheckoutFlags::empty(), dir.path()).unwrap();
        let h2 = pool.checkout(&endpoints, CheckoutFlags::empty(), dir.path()).unwrap();
        assert_eq!(h1.mastery_level, h2.mastery_level);
        pool.checkin(&h1, false).unwrap();
        pool.checkin(&h2, false).unwrap();
    }

    #[test]
    fn writer_checkout_rejects_concurrent_writer() {
        let pool = Pool::new();
        let dir = tempfile::tempdir().unwrap();
        let endpoints = endpoints_of("db2");

        let h1 = pool.checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        let err = pool
            .checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AlreadyLocked));
        pool.checkin(&h1, false).unwrap();

        let h2 = pool.checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        pool.checkin(&h2, false).unwrap();
    }

    #[test]
    fn writer_checkin_bumps_mastery_only_if_written() {
        let pool = Pool::new();
        let dir = tempfile::tempdir().unwrap();
        let endpoints = endpoints_of("db3");

        let h1 = pool.checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        pool.checkin(&h1, true).unwrap();

        let h2 = pool.checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        assert_eq!(h2.mastery_level, 1);
        pool.checkin(&h2, false).unwrap();
    }

    #[test]
    fn recover_database_clears_lock() {
        let pool = Pool::new();
        let dir = tempfile::tempdir().unwrap();
        let endpoints = endpoints_of("db4");

        let _h1 = pool.checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        pool.recover_database(&endpoints);
        let h2 = pool.checkout(&endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        pool.checkin(&h2, false).unwrap();
    }
}
