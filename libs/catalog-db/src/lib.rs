//! Database layer for catalog repositories.
//!
//! - [`DbHandle`]: pooled connection to `SQLite`, `PostgreSQL` or `MySQL` (cargo features
//!   `sqlite`, `pg`, `mysql`), built from typed [`ConnectOpts`] or a [`DatabaseConfig`].
//! - [`UnitOfWork`]: one transaction per request; every repository call receives its
//!   [`TxHandle`] explicitly.
//! - [`QueryBuilder`]: compiles typed filters and pagination into parameterized `SeaORM` selects.
//!
//! ```rust,no_run
//! use catalog_db::{ConnectOpts, DbError, DbHandle, UnitOfWorkFactory};
//! use sea_orm::ConnectionTrait;
//!
//! # async fn demo() -> Result<(), DbError> {
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let factory = UnitOfWorkFactory::new(&db);
//!
//! let uow = factory.create();
//! uow.run_in_transaction::<_, DbError, _>(|tx| {
//!     Box::pin(async move {
//!         tx.conn().execute_unprepared("SELECT 1").await?;
//!         Ok(())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(any(feature = "pg", feature = "mysql", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

pub mod config;
pub mod query;
pub mod tx_config;
pub mod uow;

mod pool_opts;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use config::DatabaseConfig;
pub use query::{QueryBuilder, QueryEntity};
pub use sea_orm::ConnectionTrait as DbConnTrait;
pub use tx_config::{TxAccessMode, TxConfig, TxIsolationLevel};
pub use uow::{AcquirePolicy, TxFuture, TxHandle, UnitOfWork, UnitOfWorkFactory, UowState};

use std::time::Duration;

#[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
use pool_opts::ApplyPoolOpts;

#[cfg(feature = "mysql")]
use sea_orm::sqlx::{MySqlPool, mysql::MySqlPoolOptions};
#[cfg(feature = "pg")]
use sea_orm::sqlx::{PgPool, postgres::PgPoolOptions};
#[cfg(feature = "sqlite")]
use sea_orm::sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use sea_orm::DatabaseConnection;
#[cfg(feature = "mysql")]
use sea_orm::SqlxMySqlConnector;
#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle, unit of work and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(#[source] Box<figment::Error>),

    #[error("No pooled connection became available after {attempts} attempt(s)")]
    PoolExhausted { attempts: u32 },

    #[error("Transaction commit failed: {0}")]
    CommitFailed(#[source] sea_orm::DbErr),

    #[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
    #[error(transparent)]
    Sqlx(#[from] sea_orm::sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<figment::Error> for DbError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    MySql,
    Sqlite,
}

/// Connection options.
/// Covers the common sqlx pool knobs plus the unit-of-work acquire policy.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Bounded wait for one connection acquire.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: bool,
    /// For `SQLite` file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
    /// `SQLite` `busy_timeout` applied to file databases.
    pub sqlite_busy_timeout: Duration,
    /// Attempts a unit of work makes to acquire a connection before giving up.
    pub acquire_attempts: u32,
    /// Delay before the second acquire attempt; doubles on each further attempt.
    pub acquire_backoff: Duration,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,
            create_sqlite_dirs: true,
            sqlite_busy_timeout: Duration::from_secs(5),
            acquire_attempts: 3,
            acquire_backoff: Duration::from_millis(50),
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "mysql")]
    MySql(MySqlPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle: the pool plus the `SeaORM` connection over it.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
    acquire: AcquirePolicy,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("mysql://") {
            Ok(DbEngine::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_owned()))
        }
    }

    /// Connect and build handle.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid, its engine is not compiled in, or the pool cannot
    /// open its first connection.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        let acquire = AcquirePolicy::from_opts(&opts)?;
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let pool = PgPoolOptions::new().apply(&opts).connect(dsn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                Ok(Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.to_owned(),
                    sea,
                    acquire,
                })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(feature = "mysql")]
            DbEngine::MySql => {
                let pool = MySqlPoolOptions::new().apply(&opts).connect(dsn).await?;
                let sea = SqlxMySqlConnector::from_sqlx_mysql_pool(pool.clone());
                Ok(Self {
                    engine,
                    pool: DbPool::MySql(pool),
                    dsn: dsn.to_owned(),
                    sea,
                    acquire,
                })
            }
            #[cfg(not(feature = "mysql"))]
            DbEngine::MySql => Err(DbError::FeatureDisabled("MySQL feature not enabled")),
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let connect_opts = sqlite::connect_options(dsn, &opts)?;
                let pool = SqlitePoolOptions::new()
                    .apply(&opts)
                    .connect_with(connect_opts)
                    .await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
                Ok(Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                    dsn: dsn.trim().to_owned(),
                    sea,
                    acquire,
                })
            }
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Connect using a loaded [`DatabaseConfig`].
    ///
    /// # Errors
    /// Same as [`DbHandle::connect`], plus invalid configuration values.
    pub async fn from_config(cfg: &DatabaseConfig) -> Result<Self> {
        Self::connect(&cfg.dsn, cfg.connect_opts()).await
    }

    /// Graceful pool close. Waits for checked-out connections to be returned.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "mysql")]
            DbPool::MySql(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Raw `SeaORM` connection outside any unit of work.
    ///
    /// Meant for schema setup and diagnostics; request code goes through [`UnitOfWork`].
    #[must_use]
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub(crate) fn acquire_policy(&self) -> AcquirePolicy {
        self.acquire
    }
}
