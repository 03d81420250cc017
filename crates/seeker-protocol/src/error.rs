use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("protocol version {0}.{1} rejected: major version too high")]
    UnsupportedVersion(u8, u8),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("connection idle timeout")]
    IdleTimeout,

    #[error("connection active timeout")]
    ActiveTimeout,

    #[error("already locked: {0}")]
    AlreadyLocked(String),

    #[error("replication failed: {0}")]
    ReplicationFailed(String),

    #[error(transparent)]
    Store(#[from] seeker_store::CheckoutError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
