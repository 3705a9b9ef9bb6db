use async_trait::async_trait;
use catalog_db::{QueryBuilder, TxHandle};
use catalog_query::{Filter, Page, PaginationData};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, RelationTrait};

use crate::domain::error::DomainError;
use crate::domain::filters::AuthorFilterField;
use crate::domain::model::{Author, NewAuthor};
use crate::domain::repos::AuthorsRepository;
use crate::infra::storage::entity::{author, book_author};

type AuthorQuery = QueryBuilder<author::Entity, AuthorFilterField>;

/// ORM-based implementation of the `AuthorsRepository` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmAuthorsRepository;

#[async_trait]
impl AuthorsRepository for OrmAuthorsRepository {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Author>, DomainError> {
        let found = author::Entity::find_by_id(id).one(tx.conn()).await?;
        Ok(found.map(Into::into))
    }

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<AuthorFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Author>, DomainError> {
        let page = AuthorQuery::new()
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        Ok(page.map_items(Into::into))
    }

    async fn list_by_book(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
    ) -> Result<Vec<Author>, DomainError> {
        let rows = AuthorQuery::new()
            .join(author::Relation::BookAuthor.def())
            .scope(book_author::Column::BookId.eq(book_id))
            .get_many(tx)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, tx: &TxHandle<'_>, author: NewAuthor) -> Result<Author, DomainError> {
        let m = author::ActiveModel {
            id: NotSet,
            first_name: Set(author.first_name),
            last_name: Set(author.last_name),
        };
        Ok(m.insert(tx.conn()).await?.into())
    }

    async fn update(&self, tx: &TxHandle<'_>, author: Author) -> Result<Author, DomainError> {
        if self.get(tx, author.id).await?.is_none() {
            return Err(DomainError::not_found("Author", author.id));
        }
        let m = author::ActiveModel {
            id: Set(author.id),
            first_name: Set(author.first_name),
            last_name: Set(author.last_name),
        };
        Ok(m.update(tx.conn()).await?.into())
    }

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError> {
        let result = author::Entity::delete_by_id(id).exec(tx.conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
