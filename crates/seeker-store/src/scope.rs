use std::path::Path;
use std::sync::Arc;

use seeker_types::Endpoints;

use crate::error::Result;
use crate::flags::CheckoutFlags;
use crate::handle::Handle;
use crate::pool::Pool;

/// RAII checkout: guarantees [`Pool::checkin`] runs on every exit path,
/// including early returns and panics during the scope's body.
pub struct ScopedCheckout {
    pool: Arc<Pool>,
    handle: Handle,
    wrote: bool,
}

impl ScopedCheckout {
    pub fn new(pool: Arc<Pool>, endpoints: &Endpoints, flags: CheckoutFlags, db_dir: &Path) -> Result<Self> {
        let handle = pool.checkout(endpoints, flags, db_dir)?;
        Ok(ScopedCheckout { pool, handle, wrote: false })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Marks this checkout as having performed at least one write, so
    /// the mastery marker is bumped on release.
    pub fn mark_written(&mut self) {
        self.wrote = true;
    }
}

impl Drop for ScopedCheckout {
    fn drop(&mut self) {
        if let Err(err) = self.pool.checkin(&self.handle, self.wrote) {
            tracing::warn!(error = %err, "checkin failed during scoped checkout drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_types::Endpoint;

    #[test]
    fn drop_releases_writable_handle() {
        let pool = Arc::new(Pool::new());
        let dir = tempfile::tempdir().unwrap();
        let mut endpoints = Endpoints::new();
        endpoints.insert(Endpoint::parse("scoped", "."));

        {
            let mut scoped = ScopedCheckout::new(pool.clone(), &endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
            scoped.mark_written();
        }

        let again = ScopedCheckout::new(pool.clone(), &endpoints, CheckoutFlags::WRITABLE, dir.path()).unwrap();
        assert_eq!(again.handle().mastery_level, 1);
    }
}
