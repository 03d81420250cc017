use seeker_types::Endpoints;

use crate::flags::CheckoutFlags;

/// A checked-out database handle (spec §3 "Database handle").
#[derive(Debug, Clone)]
pub struct Handle {
    pub endpoints: Endpoints,
    pub flags: CheckoutFlags,
    pub mastery_level: u64,
    pub revision: u64,
    pub(crate) key: u64,
}

impl Handle {
    pub fn is_writable(&self) -> bool {
        self.flags.is_writable()
    }
}
