//! Business logic. Every method takes the caller's unit-of-work handle and never commits.

mod catalog;
mod customers;
mod users;

pub use catalog::CatalogService;
pub use customers::CustomersService;
pub use users::UsersService;

use crate::domain::error::DomainError;

/// Rejects blank values and values longer than `max` characters.
fn require_text(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(
            field,
            format!("too long: {len} characters (max: {max})"),
        ));
    }
    Ok(())
}

fn require_email(field: &str, value: &str) -> Result<(), DomainError> {
    require_text(field, value, MAX_EMAIL_LEN)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::validation(field, "is not a valid email address")),
    }
}

const MAX_NAME_LEN: usize = 100;
const MAX_TITLE_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 254;
