//! Safety caps for list requests.
//!
//! Bounds the size of the raw filter expression, the number of filters and the page size so a
//! single request cannot ask for an unbounded amount of work.

use serde::{Deserialize, Serialize};

use crate::QueryError;

/// Configurable limits applied while parsing list requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryLimits {
    /// Page size used when `limit` is absent (default: 10)
    pub default_limit: u64,
    /// Largest accepted `limit`; larger values are rejected (default: 100)
    pub max_limit: u64,
    /// Maximum length of the raw `filter` parameter in bytes (default: 2000)
    pub max_filter_length: usize,
    /// Maximum number of filter entries in one request (default: 16)
    pub max_filters: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            max_filter_length: 2000,
            max_filters: 16,
        }
    }
}

impl QueryLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_limit(mut self, max: u64) -> Self {
        self.max_limit = max;
        self
    }

    #[must_use]
    pub fn with_max_filter_length(mut self, max: usize) -> Self {
        self.max_filter_length = max;
        self
    }

    #[must_use]
    pub fn with_max_filters(mut self, max: usize) -> Self {
        self.max_filters = max;
        self
    }

    /// Validate a requested page size.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidPaginationParameter`] when `limit` exceeds `max_limit`.
    pub fn validate_limit(&self, limit: u64) -> Result<(), QueryError> {
        if limit > self.max_limit {
            return Err(QueryError::pagination(
                "limit",
                format!("must not exceed {}", self.max_limit),
            ));
        }
        Ok(())
    }

    /// Validate the length of a raw filter expression.
    ///
    /// # Errors
    /// Returns [`QueryError::FilterTooLong`] when the expression is over the cap.
    pub fn validate_filter(&self, raw: &str) -> Result<(), QueryError> {
        if raw.len() > self.max_filter_length {
            return Err(QueryError::FilterTooLong {
                max: self.max_filter_length,
            });
        }
        Ok(())
    }

    /// Validate the number of filter entries.
    ///
    /// # Errors
    /// Returns [`QueryError::TooManyFilters`] when there are more than `max_filters`.
    pub fn validate_filter_count(&self, count: usize) -> Result<(), QueryError> {
        if count > self.max_filters {
            return Err(QueryError::TooManyFilters {
                max: self.max_filters,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = QueryLimits::default();
        assert_eq!(limits.default_limit, 10);
        assert_eq!(limits.max_limit, 100);
        assert_eq!(limits.max_filter_length, 2000);
        assert_eq!(limits.max_filters, 16);
    }

    #[test]
    fn test_validate_limit() {
        let limits = QueryLimits::default();
        assert!(limits.validate_limit(100).is_ok());
        assert!(matches!(
            limits.validate_limit(101),
            Err(QueryError::InvalidPaginationParameter { name: "limit", .. })
        ));
    }

    #[test]
    fn test_validate_filter_too_long() {
        let limits = QueryLimits::new().with_max_filter_length(8);
        assert!(limits.validate_filter("12345678").is_ok());
        assert_eq!(
            limits.validate_filter("123456789"),
            Err(QueryError::FilterTooLong { max: 8 })
        );
    }

    #[test]
    fn test_validate_filter_count() {
        let limits = QueryLimits::new().with_max_filters(2);
        assert!(limits.validate_filter_count(2).is_ok());
        assert_eq!(
            limits.validate_filter_count(3),
            Err(QueryError::TooManyFilters { max: 2 })
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let limits: QueryLimits = serde_json::from_str(r#"{"max_limit": 50}"#).unwrap();
        assert_eq!(limits.max_limit, 50);
        assert_eq!(limits.default_limit, 10);
    }
}
