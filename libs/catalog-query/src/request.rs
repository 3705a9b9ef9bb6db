//! Raw list request (`filter`, `page`, `limit`) as it arrives from the HTTP boundary.

use serde::Deserialize;

use crate::QueryError;
use crate::filter::{Filter, FilterField};
use crate::limits::QueryLimits;
use crate::pagination::{LIMIT_PARAM, PAGE_PARAM, PaginationData, QueryParams, parse_pagination};
use crate::parser::parse_filters;

/// Undecoded list parameters; unknown query keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Decodes a URL query string such as `filter=["title||like||crime"]&page=2&limit=5`.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidFilterSyntax`] when the query string cannot be decoded.
    pub fn from_query_str(query: &str) -> Result<Self, QueryError> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| QueryError::InvalidFilterSyntax(format!("malformed query string: {e}")))
    }

    /// Validates the parameters against the allow-list `F` and `limits`.
    ///
    /// # Errors
    /// Returns the first filter or pagination [`QueryError`].
    pub fn parse<F: FilterField>(
        &self,
        limits: &QueryLimits,
    ) -> Result<ListRequest<F>, QueryError> {
        let filters = parse_filters(self.filter.as_deref(), limits)?;
        let pagination = parse_pagination(self, limits)?;
        Ok(ListRequest {
            filters,
            pagination,
        })
    }
}

impl QueryParams for ListQuery {
    fn param(&self, key: &str) -> Option<&str> {
        match key {
            PAGE_PARAM => self.page.as_deref(),
            LIMIT_PARAM => self.limit.as_deref(),
            _ => None,
        }
    }
}

/// Filters and pagination of one list call, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest<F> {
    pub filters: Vec<Filter<F>>,
    pub pagination: PaginationData,
}

impl<F: FilterField> ListRequest<F> {
    /// Decodes and validates a URL query string in one step.
    ///
    /// # Errors
    /// Returns the first decoding, filter or pagination [`QueryError`].
    pub fn from_query_str(query: &str, limits: &QueryLimits) -> Result<Self, QueryError> {
        ListQuery::from_query_str(query)?.parse(limits)
    }

    /// No filters, first page.
    #[must_use]
    pub fn unfiltered(limits: &QueryLimits) -> Self {
        Self {
            filters: Vec::new(),
            pagination: PaginationData::first(limits),
        }
    }
}
