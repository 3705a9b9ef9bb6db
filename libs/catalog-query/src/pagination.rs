//! `page`/`limit` parsing into a bounded [`PaginationData`].

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::QueryError;
use crate::limits::QueryLimits;

pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";

/// Largest offset accepted; databases bind offsets as signed 64-bit integers.
pub const MAX_OFFSET: u64 = u64::MAX >> 1;

/// Validated page/limit pair. `page` and `limit` are both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaginationData {
    page: u64,
    limit: u64,
}

impl PaginationData {
    /// Builds a pagination pair, validating it against `limits`.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidPaginationParameter`] for a zero page or limit, a limit over
    /// the configured maximum, or a page whose offset exceeds `i64::MAX` (the largest offset a
    /// database accepts as a bound parameter).
    pub fn new(page: u64, limit: u64, limits: &QueryLimits) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::pagination(PAGE_PARAM, "must be a positive integer"));
        }
        if limit == 0 {
            return Err(QueryError::pagination(LIMIT_PARAM, "must be a positive integer"));
        }
        limits.validate_limit(limit)?;
        let in_range = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| offset <= MAX_OFFSET);
        if !in_range {
            return Err(QueryError::pagination(PAGE_PARAM, "is out of range"));
        }
        Ok(Self { page, limit })
    }

    /// First page with the configured default size.
    #[must_use]
    pub fn first(limits: &QueryLimits) -> Self {
        Self {
            page: 1,
            limit: limits.default_limit.clamp(1, limits.max_limit.max(1)),
        }
    }

    #[must_use]
    pub fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        // Overflow is ruled out at construction.
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Read access to raw query parameters.
pub trait QueryParams {
    fn param(&self, key: &str) -> Option<&str>;
}

impl<S: BuildHasher> QueryParams for HashMap<String, String, S> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl QueryParams for BTreeMap<String, String> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> QueryParams for [(K, V)] {
    fn param(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_ref())
    }
}

/// Reads `page` and `limit`; absent values default to page 1 and `limits.default_limit`.
///
/// # Errors
/// Returns [`QueryError::InvalidPaginationParameter`] for non-numeric or non-positive values and
/// for a limit above `limits.max_limit`.
pub fn parse_pagination<Q: QueryParams + ?Sized>(
    query: &Q,
    limits: &QueryLimits,
) -> Result<PaginationData, QueryError> {
    let defaults = PaginationData::first(limits);
    let page = read_positive(query, PAGE_PARAM)?.unwrap_or(defaults.page);
    let limit = read_positive(query, LIMIT_PARAM)?.unwrap_or(defaults.limit);
    PaginationData::new(page, limit, limits)
}

fn read_positive<Q: QueryParams + ?Sized>(
    query: &Q,
    name: &'static str,
) -> Result<Option<u64>, QueryError> {
    let Some(raw) = query.param(name) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<u64>() {
        Ok(0) => Err(QueryError::pagination(name, "must be a positive integer")),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(QueryError::pagination(
            name,
            format!("'{raw}' is not a positive integer"),
        )),
    }
}
