use thiserror::Error;

use crate::filter::{FieldKind, FilterOp};

/// Client input errors raised while turning a raw list request into filters and pagination.
///
/// Every variant is recoverable at the request boundary and maps to a 400 [`crate::Problem`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid filter syntax: {0}")]
    InvalidFilterSyntax(String),

    #[error("unsupported filter field: {0}")]
    UnsupportedFilterField(String),

    #[error("operator '{op}' is not supported for field '{field}'")]
    UnsupportedFilterOperator { field: String, op: String },

    #[error("operand '{value}' of field '{field}' is not a valid {kind}")]
    InvalidFilterOperandType {
        field: String,
        kind: FieldKind,
        value: String,
    },

    #[error("operator '{op}' on field '{field}' expects {expected} operand(s), got {got}")]
    InvalidOperandCount {
        field: String,
        op: FilterOp,
        expected: &'static str,
        got: usize,
    },

    #[error("range of field '{field}' is empty: lower bound is greater than upper bound")]
    InvalidRange { field: String },

    #[error("filter expression exceeds maximum length of {max} characters")]
    FilterTooLong { max: usize },

    #[error("too many filters (max: {max})")]
    TooManyFilters { max: usize },

    #[error("invalid pagination parameter '{name}': {reason}")]
    InvalidPaginationParameter { name: &'static str, reason: String },
}

impl QueryError {
    /// Stable machine-readable code used in problem responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilterSyntax(_) => "invalid_filter_syntax",
            Self::UnsupportedFilterField(_) => "unsupported_filter_field",
            Self::UnsupportedFilterOperator { .. } => "unsupported_filter_operator",
            Self::InvalidFilterOperandType { .. } => "invalid_filter_operand_type",
            Self::InvalidOperandCount { .. } => "invalid_operand_count",
            Self::InvalidRange { .. } => "invalid_range",
            Self::FilterTooLong { .. } => "filter_too_long",
            Self::TooManyFilters { .. } => "too_many_filters",
            Self::InvalidPaginationParameter { .. } => "invalid_pagination_parameter",
        }
    }

    /// Short human-readable title for the error class.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidPaginationParameter { .. } => "Invalid Pagination",
            _ => "Invalid Filter",
        }
    }

    pub(crate) fn pagination(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPaginationParameter {
            name,
            reason: reason.into(),
        }
    }
}
