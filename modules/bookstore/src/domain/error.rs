use catalog_db::DbError;
use catalog_query::{Problem, QueryError};
use http::StatusCode;
use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl DomainError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn conflict(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            field,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stored value that no longer maps onto the domain model.
    pub(crate) fn corrupt(entity: &'static str, id: i64, reason: &str) -> Self {
        Self::Database(DbError::Sea(sea_orm::DbErr::Type(format!(
            "{entity} {id} has an invalid stored value: {reason}"
        ))))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(DbError::Sea(err))
    }
}

/// Convert domain errors to RFC 9457 problems for the request boundary.
impl From<DomainError> for Problem {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity, id } => Problem::new(
                StatusCode::NOT_FOUND,
                "Not Found",
                format!("{entity} {id} does not exist"),
            )
            .with_code("not_found"),
            e @ DomainError::Conflict { .. } => {
                Problem::new(StatusCode::CONFLICT, "Conflict", e.to_string()).with_code("conflict")
            }
            e @ DomainError::Validation { .. } => {
                Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed", e.to_string())
                    .with_code("validation")
            }
            DomainError::Query(q) => q.into(),
            DomainError::Database(DbError::PoolExhausted { .. }) => Problem::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                "the database is busy, retry later",
            )
            .with_code("db_unavailable"),
            DomainError::Database(_) => Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "internal database error",
            )
            .with_code("internal"),
        }
    }
}
