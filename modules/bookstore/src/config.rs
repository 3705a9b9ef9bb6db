//! Module configuration.
//!
//! Loaded with `figment` from built-in defaults, an optional YAML file and `BOOKSTORE__*`
//! environment variables, in that order of precedence:
//!
//! ```yaml
//! database:
//!   dsn: "sqlite://data/bookstore.db"
//!   max_conns: 8
//!   acquire_timeout: 2s
//!   transaction:
//!     isolation: read_committed
//! limits:
//!   default_limit: 20
//!   max_limit: 100
//! ```
//!
//! `BOOKSTORE__DATABASE__MAX_CONNS=4` overrides `database.max_conns`.

use std::path::Path;

use catalog_db::{DatabaseConfig, DbError};
use catalog_query::QueryLimits;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix; `__` separates nested keys.
pub const ENV_PREFIX: &str = "BOOKSTORE__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[source] Box<figment::Error>),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Invalid query limits: {0}")]
    Limits(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookstoreConfig {
    pub database: DatabaseConfig,
    pub limits: QueryLimits,
}

impl BookstoreConfig {
    /// # Errors
    /// See [`BookstoreConfig::load_with_prefix`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Defaults, then `path`, then `{env_prefix}*` variables.
    ///
    /// # Errors
    /// Returns [`ConfigError::Figment`] when a source is malformed or a value has the wrong type,
    /// and [`ConfigError::Database`] / [`ConfigError::Limits`] when merged values are inconsistent.
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
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

    /// # Errors
    /// Returns the first inconsistency found in the database settings or the query limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        let limits = &self.limits;
        if limits.default_limit == 0 || limits.default_limit > limits.max_limit {
            return Err(ConfigError::Limits(format!(
                "default_limit ({}) must be between 1 and max_limit ({})",
                limits.default_limit, limits.max_limit
            )));
        }
        if limits.max_filters == 0 {
            return Err(ConfigError::Limits(
                "max_filters must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn yaml_and_env_layers_merge() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "database:\n  dsn: \"sqlite::memory:\"\n  acquire_timeout: 2s\nlimits:\n  default_limit: 20"
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("BOOKSTORE_TEST__DATABASE__MAX_CONNS", Some("3")),
                ("BOOKSTORE_TEST__LIMITS__MAX_LIMIT", Some("50")),
            ],
            || {
                let cfg = BookstoreConfig::load_with_prefix(Some(file.path()), "BOOKSTORE_TEST__")
                    .unwrap();
                assert_eq!(cfg.database.dsn, "sqlite::memory:");
                assert_eq!(cfg.database.acquire_timeout, Some(Duration::from_secs(2)));
                assert_eq!(cfg.database.max_conns, Some(3));
                assert_eq!(cfg.limits.default_limit, 20);
                assert_eq!(cfg.limits.max_limit, 50);
                assert_eq!(cfg.limits.max_filters, QueryLimits::default().max_filters);
            },
        );
    }

    #[test]
    fn default_limit_above_max_is_rejected() {
        temp_env::with_var("BOOKSTORE_BAD__LIMITS__DEFAULT_LIMIT", Some("500"), || {
            let err = BookstoreConfig::load_with_prefix(None, "BOOKSTORE_BAD__").unwrap_err();
            assert!(matches!(err, ConfigError::Limits(_)));
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "limits:\n  max_pages: 3").unwrap();
        let err = BookstoreConfig::load_with_prefix(Some(file.path()), "BOOKSTORE_NONE__")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }
}
