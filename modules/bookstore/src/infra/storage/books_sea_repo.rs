use async_trait::async_trait;
use catalog_db::{QueryBuilder, TxHandle};
use catalog_query::{Filter, Page, PaginationData};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, RelationTrait};

use crate::domain::error::DomainError;
use crate::domain::filters::BookFilterField;
use crate::domain::model::{Book, NewBook};
use crate::domain::repos::BooksRepository;
use crate::infra::storage::entity::{book, book_author, book_category};
use crate::infra::storage::mapper::try_page;

type BookQuery = QueryBuilder<book::Entity, BookFilterField>;

/// ORM-based implementation of the `BooksRepository` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmBooksRepository;

#[async_trait]
impl BooksRepository for OrmBooksRepository {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Book>, DomainError> {
        book::Entity::find_by_id(id)
            .one(tx.conn())
            .await?
            .map(Book::try_from)
            .transpose()
    }

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError> {
        let page = BookQuery::new()
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        try_page(page)
    }

    async fn list_by_author(
        &self,
        tx: &TxHandle<'_>,
        author_id: i64,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError> {
        let page = BookQuery::new()
            .join(book::Relation::BookAuthor.def())
            .scope(book_author::Column::AuthorId.eq(author_id))
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        try_page(page)
    }

    async fn list_by_category(
        &self,
        tx: &TxHandle<'_>,
        category_id: i64,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError> {
        let page = BookQuery::new()
            .join(book::Relation::BookCategory.def())
            .scope(book_category::Column::CategoryId.eq(category_id))
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        try_page(page)
    }

    async fn create(&self, tx: &TxHandle<'_>, book: &NewBook) -> Result<Book, DomainError> {
        let m = book::ActiveModel {
            id: NotSet,
            title: Set(book.title.clone()),
            isbn: Set(book.isbn.clone()),
            release_year: Set(book.release_year),
            price: Set(book.price),
            format: Set(book.format.as_str().to_owned()),
            released_on: Set(book.released_on),
        };
        Book::try_from(m.insert(tx.conn()).await?)
    }

    async fn update(&self, tx: &TxHandle<'_>, book: Book) -> Result<Book, DomainError> {
        let exists = book::Entity::find_by_id(book.id)
            .one(tx.conn())
            .await?
            .is_some();
        if !exists {
            return Err(DomainError::not_found("Book", book.id));
        }

        let m = book::ActiveModel {
            id: Set(book.id),
            title: Set(book.title),
            isbn: Set(book.isbn),
            release_year: Set(book.release_year),
            price: Set(book.price),
            format: Set(book.format.as_str().to_owned()),
            released_on: Set(book.released_on),
        };
        Book::try_from(m.update(tx.conn()).await?)
    }

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError> {
        let result = book::Entity::delete_by_id(id).exec(tx.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    async fn link_author(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        author_id: i64,
    ) -> Result<(), DomainError> {
        let link = book_author::ActiveModel {
            book_id: Set(book_id),
            author_id: Set(author_id),
        };
        book_author::Entity::insert(link)
            .exec_without_returning(tx.conn())
            .await?;
        Ok(())
    }

    async fn link_category(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        category_id: i64,
    ) -> Result<(), DomainError> {
        let link = book_category::ActiveModel {
            book_id: Set(book_id),
            category_id: Set(category_id),
        };
        book_category::Entity::insert(link)
            .exec_without_returning(tx.conn())
            .await?;
        Ok(())
    }
}
