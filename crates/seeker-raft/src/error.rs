use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaftError {
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error("unsupported major version {0}")]
    UnsupportedVersion(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RaftError>;
