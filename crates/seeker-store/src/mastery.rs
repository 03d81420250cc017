use std::fs;
use std::path::{Path, PathBuf};

use seeker_types::{Error, Result};

const MARKER_FILE_NAME: &str = ".mastery";

/// Per-endpoint monotonically increasing generation marker, persisted
/// as a plain text file alongside the database (`database_handler.cc`'s
/// `mastery()`: read-or-initialize-to-zero, bump-on-first-write after a
/// node restart — see `SPEC_FULL.md` item 1).
pub fn marker_path(db_dir: &Path) -> PathBuf {
    db_dir.join(MARKER_FILE_NAME)
}

/// Reads the current mastery level, initializing the marker file to
/// `0` if this is the first time the endpoint is opened.
pub fn read_or_init(db_dir: &Path) -> Result<u64> {
    let path = marker_path(db_dir);
    match fs::read_to_string(&path) {
        Ok(contents) => contents
            .trim()
            .parse()
            .map_err(|_| Error::BackendError(format!("corrupt mastery marker at {}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::write(&path, "0")?;
            Ok(0)
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Bumps the mastery level on first write after (re)open and persists
/// it. Subsequent writes within the same open session do not bump it
/// again — callers only invoke this once, right after acquiring a
/// writable handle.
pub fn bump(db_dir: &Path, current: u64) -> Result<u64> {
    let next = current + 1;
    fs::write(marker_path(db_dir), next.to_string())?;
    Ok(next)
}
