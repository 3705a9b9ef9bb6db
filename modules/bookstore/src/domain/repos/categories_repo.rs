use async_trait::async_trait;
use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};

use crate::domain::error::DomainError;
use crate::domain::filters::CategoryFilterField;
use crate::domain::model::{Category, NewCategory};

#[async_trait]
pub trait CategoriesRepository: Send + Sync {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Category>, DomainError>;

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<CategoryFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Category>, DomainError>;

    /// Filtered page of the categories a book belongs to.
    async fn list_by_book(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        filters: &[Filter<CategoryFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Category>, DomainError>;

    /// Every category of a book, unpaged.
    async fn all_by_book(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
    ) -> Result<Vec<Category>, DomainError>;

    async fn create(
        &self,
        tx: &TxHandle<'_>,
        category: NewCategory,
    ) -> Result<Category, DomainError>;

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError>;
}
