use thiserror::Error;

/// Checkout-path errors (spec §4.D; `lock_database.h`'s distinct
/// exception type for the already-locked condition, per `SPEC_FULL.md`
/// item 2 — kept as its own variant rather than folded into
/// `BackendError` so callers can pattern-match on it).
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("endpoint is already locked for writing")]
    AlreadyLocked,

    #[error("concurrent modification, retries exhausted after {0} attempts")]
    ConcurrentModification(u32),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("backend error: {0}")]
    BackendError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CheckoutError> for seeker_types::Error {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::AlreadyLocked => seeker_types::Error::AlreadyLocked("endpoint".to_string()),
            CheckoutError::ConcurrentModification(n) => {
                seeker_types::Error::ConcurrentModification(format!("retries exhausted after {n} attempts"))
            }
            CheckoutError::NetworkError(msg) => seeker_types::Error::NetworkError(msg),
            CheckoutError::BackendError(msg) => seeker_types::Error::BackendError(msg),
            CheckoutError::Io(e) => seeker_types::Error::Io(e),
        }
    }
}

impl From<seeker_types::Error> for CheckoutError {
    fn from(e: seeker_types::Error) -> Self {
        match e {
            seeker_types::Error::AlreadyLocked(_) => CheckoutError::AlreadyLocked,
            seeker_types::Error::ConcurrentModification(_) => CheckoutError::ConcurrentModification(0),
            seeker_types::Error::NetworkError(msg) => CheckoutError::NetworkError(msg),
            seeker_types::Error::Io(e) => CheckoutError::Io(e),
            other => CheckoutError::BackendError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
