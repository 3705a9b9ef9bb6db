use async_trait::async_trait;
use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};

use crate::domain::error::DomainError;
use crate::domain::filters::UserFilterField;
use crate::domain::model::{NewUser, User};

/// Repository trait for User persistence operations.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<User>, DomainError>;

    /// Exact, case-sensitive match on the stored email.
    async fn find_by_email(
        &self,
        tx: &TxHandle<'_>,
        email: &str,
    ) -> Result<Option<User>, DomainError>;

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<UserFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<User>, DomainError>;

    /// Fails with [`DomainError::Conflict`] when the email is already taken.
    async fn create(&self, tx: &TxHandle<'_>, user: NewUser) -> Result<User, DomainError>;

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError>;
}
