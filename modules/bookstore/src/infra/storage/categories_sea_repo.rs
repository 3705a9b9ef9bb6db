use async_trait::async_trait;
use catalog_db::{QueryBuilder, TxHandle};
use catalog_query::{Filter, Page, PaginationData};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, RelationTrait, SqlErr};

use crate::domain::error::DomainError;
use crate::domain::filters::CategoryFilterField;
use crate::domain::model::{Category, NewCategory};
use crate::domain::repos::CategoriesRepository;
use crate::infra::storage::entity::{book_category, category};

type CategoryQuery = QueryBuilder<category::Entity, CategoryFilterField>;

/// ORM-based implementation of the `CategoriesRepository` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmCategoriesRepository;

impl OrmCategoriesRepository {
    fn of_book(book_id: i64) -> CategoryQuery {
        CategoryQuery::new()
            .join(category::Relation::BookCategory.def())
            .scope(book_category::Column::BookId.eq(book_id))
    }
}

#[async_trait]
impl CategoriesRepository for OrmCategoriesRepository {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Category>, DomainError> {
        let found = category::Entity::find_by_id(id).one(tx.conn()).await?;
        Ok(found.map(Into::into))
    }

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<CategoryFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Category>, DomainError> {
        let page = CategoryQuery::new()
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        Ok(page.map_items(Into::into))
    }

    async fn list_by_book(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        filters: &[Filter<CategoryFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Category>, DomainError> {
        let page = Self::of_book(book_id)
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        Ok(page.map_items(Into::into))
    }

    async fn all_by_book(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
    ) -> Result<Vec<Category>, DomainError> {
        let rows = Self::of_book(book_id).get_many(tx).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(
        &self,
        tx: &TxHandle<'_>,
        category: NewCategory,
    ) -> Result<Category, DomainError> {
        let m = category::ActiveModel {
            id: NotSet,
            name: Set(category.name.clone()),
        };
        match m.insert(tx.conn()).await {
            Ok(row) => Ok(row.into()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DomainError::conflict("Category", "name", category.name))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError> {
        let result = category::Entity::delete_by_id(id).exec(tx.conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
