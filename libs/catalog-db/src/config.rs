//! Database configuration loaded through `figment`.
//!
//! Sources, lowest priority first: built-in defaults, an optional YAML file, then environment
//! variables with a caller-chosen prefix and `__` as the nesting separator
//! (`BOOKSTORE__DATABASE__MAX_CONNS=4`).

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::tx_config::TxConfig;
use crate::{ConnectOpts, DbError, Result};

/// Pool and unit-of-work settings for one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub dsn: String,
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: bool,
    pub acquire_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub sqlite_busy_timeout: Duration,
    pub create_sqlite_dirs: bool,
    pub transaction: TxConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let opts = ConnectOpts::default();
        Self {
            dsn: "sqlite://data/catalog.db".to_owned(),
            max_conns: opts.max_conns,
            min_conns: opts.min_conns,
            acquire_timeout: opts.acquire_timeout,
            idle_timeout: opts.idle_timeout,
            max_lifetime: opts.max_lifetime,
            test_before_acquire: opts.test_before_acquire,
            acquire_attempts: opts.acquire_attempts,
            acquire_backoff: opts.acquire_backoff,
            sqlite_busy_timeout: opts.sqlite_busy_timeout,
            create_sqlite_dirs: opts.create_sqlite_dirs,
            transaction: TxConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Defaults, then `path` (if it exists), then `{prefix}*` environment variables.
    ///
    /// # Errors
    /// Returns [`DbError::Config`] when a source cannot be parsed or a value has the wrong type,
    /// and [`DbError::InvalidConfig`] when the merged values are inconsistent.
    pub fn load(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let cfg: Self = figment
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Extract from an existing figment, e.g. a section of a larger application config.
    ///
    /// # Errors
    /// Same as [`DatabaseConfig::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns [`DbError::InvalidConfig`] for an empty DSN, zero acquire attempts or
    /// `min_conns > max_conns`.
    pub fn validate(&self) -> Result<()> {
        if self.dsn.trim().is_empty() {
            return Err(DbError::InvalidConfig("dsn must not be empty".to_owned()));
        }
        if self.acquire_attempts == 0 {
            return Err(DbError::InvalidConfig(
                "acquire_attempts must be at least 1".to_owned(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_conns, self.max_conns)
            && min > max
        {
            return Err(DbError::InvalidConfig(format!(
                "min_conns ({min}) exceeds max_conns ({max})"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            max_conns: self.max_conns,
            min_conns: self.min_conns,
            acquire_timeout: self.acquire_timeout,
            idle_timeout: self.idle_timeout,
            max_lifetime: self.max_lifetime,
            test_before_acquire: self.test_before_acquire,
            create_sqlite_dirs: self.create_sqlite_dirs,
            sqlite_busy_timeout: self.sqlite_busy_timeout,
            acquire_attempts: self.acquire_attempts,
            acquire_backoff: self.acquire_backoff,
        }
    }
}
