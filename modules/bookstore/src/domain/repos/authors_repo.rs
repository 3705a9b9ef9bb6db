use async_trait::async_trait;
use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};

use crate::domain::error::DomainError;
use crate::domain::filters::AuthorFilterField;
use crate::domain::model::{Author, NewAuthor};

#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Author>, DomainError>;

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<AuthorFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Author>, DomainError>;

    /// All authors of a book, in insertion order.
    async fn list_by_book(&self, tx: &TxHandle<'_>, book_id: i64)
    -> Result<Vec<Author>, DomainError>;

    async fn create(&self, tx: &TxHandle<'_>, author: NewAuthor) -> Result<Author, DomainError>;

    async fn update(&self, tx: &TxHandle<'_>, author: Author) -> Result<Author, DomainError>;

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError>;
}
