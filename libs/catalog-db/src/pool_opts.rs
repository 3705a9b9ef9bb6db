//! Applies [`ConnectOpts`] to any sqlx pool builder.

use sea_orm::sqlx::Database;
use sea_orm::sqlx::pool::PoolOptions;

use crate::ConnectOpts;

pub trait ApplyPoolOpts {
    /// Apply connection options to the pool builder.
    #[must_use]
    fn apply(self, opts: &ConnectOpts) -> Self;
}

impl<DB: Database> ApplyPoolOpts for PoolOptions<DB> {
    fn apply(mut self, opts: &ConnectOpts) -> Self {
        if let Some(n) = opts.max_conns {
            self = self.max_connections(n);
        }
        if let Some(n) = opts.min_conns {
            self = self.min_connections(n);
        }
        if let Some(t) = opts.acquire_timeout {
            self = self.acquire_timeout(t);
        }
        if let Some(t) = opts.idle_timeout {
            self = self.idle_timeout(t);
        }
        if let Some(t) = opts.max_lifetime {
            self = self.max_lifetime(t);
        }
        if opts.test_before_acquire {
            self = self.test_before_acquire(true);
        }
        self
    }
}
