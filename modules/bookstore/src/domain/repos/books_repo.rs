use async_trait::async_trait;
use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};

use crate::domain::error::DomainError;
use crate::domain::filters::BookFilterField;
use crate::domain::model::{Book, NewBook};

/// Repository trait for Book persistence operations.
///
/// Every method runs inside the unit of work owning `tx`; none of them commits.
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Book>, DomainError>;

    /// Filtered page of all books, in insertion order.
    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError>;

    /// Filtered page of the books written by one author.
    async fn list_by_author(
        &self,
        tx: &TxHandle<'_>,
        author_id: i64,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError>;

    /// Filtered page of the books in one category.
    async fn list_by_category(
        &self,
        tx: &TxHandle<'_>,
        category_id: i64,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError>;

    /// Inserts the book row only; links are added with `link_author` / `link_category`.
    async fn create(&self, tx: &TxHandle<'_>, book: &NewBook) -> Result<Book, DomainError>;

    async fn update(&self, tx: &TxHandle<'_>, book: Book) -> Result<Book, DomainError>;

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError>;

    async fn link_author(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        author_id: i64,
    ) -> Result<(), DomainError>;

    async fn link_category(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        category_id: i64,
    ) -> Result<(), DomainError>;
}
