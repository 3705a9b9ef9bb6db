use std::time::Duration;

use sea_orm::DatabaseConnection;

use super::{TxFuture, UnitOfWork};
use crate::tx_config::TxConfig;
use crate::{ConnectOpts, DbError, DbHandle};

/// How a unit of work retries when the pool has no free connection.
///
/// Each attempt waits at most the pool's `acquire_timeout`; the delay between attempts starts at
/// `backoff` and doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquirePolicy {
    attempts: u32,
    backoff: Duration,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl AcquirePolicy {
    /// # Errors
    /// Returns [`DbError::InvalidConfig`] when `attempts` is zero.
    pub fn new(attempts: u32, backoff: Duration) -> Result<Self, DbError> {
        if attempts == 0 {
            return Err(DbError::InvalidConfig(
                "acquire_attempts must be at least 1".to_owned(),
            ));
        }
        Ok(Self { attempts, backoff })
    }

    pub(crate) fn from_opts(opts: &ConnectOpts) -> Result<Self, DbError> {
        Self::new(opts.acquire_attempts, opts.acquire_backoff)
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

/// Issues fresh [`UnitOfWork`]s over one connection pool.
///
/// Cheap to clone; share one per application and create one unit of work per request.
#[derive(Debug, Clone)]
pub struct UnitOfWorkFactory {
    conn: DatabaseConnection,
    acquire: AcquirePolicy,
    config: TxConfig,
}

impl UnitOfWorkFactory {
    #[must_use]
    pub fn new(db: &DbHandle) -> Self {
        Self {
            conn: db.sea(),
            acquire: db.acquire_policy(),
            config: TxConfig::default(),
        }
    }

    #[must_use]
    pub fn with_tx_config(mut self, config: TxConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_acquire_policy(mut self, acquire: AcquirePolicy) -> Self {
        self.acquire = acquire;
        self
    }

    #[must_use]
    pub fn tx_config(&self) -> TxConfig {
        self.config
    }

    /// A unit of work in the `Created` state.
    ///
    /// The pooled connection is acquired when its transaction begins, so an unused unit holds
    /// nothing.
    #[must_use]
    pub fn create(&self) -> UnitOfWork {
        UnitOfWork::new(self.conn.clone(), self.acquire, self.config)
    }

    /// Runs `f` in a fresh unit of work.
    ///
    /// # Errors
    /// See [`UnitOfWork::run_in_transaction`].
    pub async fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(super::TxHandle<'a>) -> TxFuture<'a, T, E> + Send,
        T: Send,
        E: From<DbError> + Send,
    {
        self.create().run_in_transaction(f).await
    }
}
