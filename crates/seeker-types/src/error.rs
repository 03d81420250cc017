use thiserror::Error;

/// The error taxonomy every component collapses into before it leaves
/// the core (spec §6 "Error kinds", §7 "Error handling design").
///
/// Internal retries (concurrent-modification, already-locked, network)
/// are handled by the component that owns the retry budget; only
/// exhausted or non-retryable failures should ever construct one of
/// these at the boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("client error: {0}")]
    ClientError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("already locked: {0}")]
    AlreadyLocked(String),

    #[error("concurrent modification, retries exhausted: {0}")]
    ConcurrentModification(String),

    #[error("type mismatch on field `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("missing type for field `{field}`")]
    MissingType { field: String },

    #[error("missing required field `{field}`")]
    MissingRequired { field: String },

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("replication failed: {0}")]
    ReplicationFailed(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("script error: {0}")]
    ScriptError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
