//! Database handle and pool management (spec §4.D): checkout/checkin
//! of local endpoint sets with single-writer/many-reader exclusion,
//! the mastery generation marker, and recovery after a forced close.

pub mod error;
pub mod flags;
pub mod handle;
pub mod mastery;
pub mod pool;
pub mod schema_lru;
pub mod scope;

pub use error::{CheckoutError, Result};
pub use flags::CheckoutFlags;
pub use handle::Handle;
pub use pool::{Pool, DB_RETRIES};
pub use schema_lru::SchemaLru;
pub use scope::ScopedCheckout;
