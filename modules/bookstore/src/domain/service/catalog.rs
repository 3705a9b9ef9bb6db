use std::sync::Arc;

use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};
use tracing::{debug, info, instrument};

use super::{MAX_NAME_LEN, MAX_TITLE_LEN, require_text};
use crate::domain::error::DomainError;
use crate::domain::filters::{AuthorFilterField, BookFilterField, CategoryFilterField};
use crate::domain::model::{
    Author, Book, BookDetails, BookPatch, Category, NewAuthor, NewBook, NewCategory,
};
use crate::domain::repos::{AuthorsRepository, BooksRepository, CategoriesRepository};

/// Books, their authors and categories.
pub struct CatalogService<B: BooksRepository, A: AuthorsRepository, C: CategoriesRepository> {
    books: Arc<B>,
    authors: Arc<A>,
    categories: Arc<C>,
}

impl<B: BooksRepository, A: AuthorsRepository, C: CategoriesRepository> CatalogService<B, A, C> {
    #[must_use]
    pub fn new(books: Arc<B>, authors: Arc<A>, categories: Arc<C>) -> Self {
        Self {
            books,
            authors,
            categories,
        }
    }
}

// Books
impl<B: BooksRepository, A: AuthorsRepository, C: CategoriesRepository> CatalogService<B, A, C> {
    #[instrument(skip(self, tx), fields(book_id = id))]
    pub async fn get_book(&self, tx: &TxHandle<'_>, id: i64) -> Result<BookDetails, DomainError> {
        debug!("Getting book by id");
        let book = self.require_book(tx, id).await?;
        self.details(tx, book).await
    }

    #[instrument(skip_all, fields(filters = filters.len(), page = pagination.page()))]
    pub async fn list_books(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError> {
        let page = self.books.list(tx, filters, pagination).await?;
        debug!("Successfully listed {} books in page", page.items.len());
        Ok(page)
    }

    /// Books written by one author.
    #[instrument(skip(self, tx, filters, pagination), fields(filters = filters.len()))]
    pub async fn list_author_books(
        &self,
        tx: &TxHandle<'_>,
        author_id: i64,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError> {
        self.require_author(tx, author_id).await?;
        let page = self
            .books
            .list_by_author(tx, author_id, filters, pagination)
            .await?;
        debug!("Successfully listed {} books of author", page.items.len());
        Ok(page)
    }

    /// Books in one category.
    #[instrument(skip(self, tx, filters, pagination), fields(filters = filters.len()))]
    pub async fn list_category_books(
        &self,
        tx: &TxHandle<'_>,
        category_id: i64,
        filters: &[Filter<BookFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Book>, DomainError> {
        if self.categories.get(tx, category_id).await?.is_none() {
            return Err(DomainError::not_found("Category", category_id));
        }
        let page = self
            .books
            .list_by_category(tx, category_id, filters, pagination)
            .await?;
        Ok(page)
    }

    /// Creates the book and links it to existing authors and categories.
    ///
    /// Every referenced author and category must exist; nothing is written otherwise.
    #[instrument(skip(self, tx, new_book), fields(title = %new_book.title))]
    pub async fn create_book(
        &self,
        tx: &TxHandle<'_>,
        new_book: NewBook,
    ) -> Result<BookDetails, DomainError> {
        info!("Creating book");
        validate_new_book(&new_book)?;

        for &author_id in &new_book.author_ids {
            self.require_author(tx, author_id).await?;
        }
        for &category_id in &new_book.category_ids {
            if self.categories.get(tx, category_id).await?.is_none() {
                return Err(DomainError::not_found("Category", category_id));
            }
        }

        let book = self.books.create(tx, &new_book).await?;
        for &author_id in &new_book.author_ids {
            self.books.link_author(tx, book.id, author_id).await?;
        }
        for &category_id in &new_book.category_ids {
            self.books.link_category(tx, book.id, category_id).await?;
        }

        info!(book_id = book.id, "Successfully created book");
        self.details(tx, book).await
    }

    #[instrument(skip(self, tx, patch), fields(book_id = id))]
    pub async fn update_book(
        &self,
        tx: &TxHandle<'_>,
        id: i64,
        patch: BookPatch,
    ) -> Result<Book, DomainError> {
        let mut book = self.require_book(tx, id).await?;
        if let Some(title) = patch.title {
            require_text("title", &title, MAX_TITLE_LEN)?;
            book.title = title;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            book.price = price;
        }
        if let Some(format) = patch.format {
            book.format = format;
        }

        let book = self.books.update(tx, book).await?;
        info!("Successfully updated book");
        Ok(book)
    }

    #[instrument(skip(self, tx), fields(book_id = id))]
    pub async fn delete_book(&self, tx: &TxHandle<'_>, id: i64) -> Result<(), DomainError> {
        if !self.books.delete(tx, id).await? {
            return Err(DomainError::not_found("Book", id));
        }
        info!("Successfully deleted book");
        Ok(())
    }

    async fn require_book(&self, tx: &TxHandle<'_>, id: i64) -> Result<Book, DomainError> {
        self.books
            .get(tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Book", id))
    }

    async fn details(&self, tx: &TxHandle<'_>, book: Book) -> Result<BookDetails, DomainError> {
        let authors = self.authors.list_by_book(tx, book.id).await?;
        let categories = self.categories.all_by_book(tx, book.id).await?;
        Ok(BookDetails {
            book,
            authors,
            categories,
        })
    }
}

// Authors
impl<B: BooksRepository, A: AuthorsRepository, C: CategoriesRepository> CatalogService<B, A, C> {
    #[instrument(skip(self, tx), fields(author_id = id))]
    pub async fn get_author(&self, tx: &TxHandle<'_>, id: i64) -> Result<Author, DomainError> {
        self.require_author(tx, id).await
    }

    #[instrument(skip_all, fields(filters = filters.len(), page = pagination.page()))]
    pub async fn list_authors(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<AuthorFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Author>, DomainError> {
        self.authors.list(tx, filters, pagination).await
    }

    #[instrument(skip(self, tx, author))]
    pub async fn create_author(
        &self,
        tx: &TxHandle<'_>,
        author: NewAuthor,
    ) -> Result<Author, DomainError> {
        require_text("first_name", &author.first_name, MAX_NAME_LEN)?;
        require_text("last_name", &author.last_name, MAX_NAME_LEN)?;
        let author = self.authors.create(tx, author).await?;
        info!(author_id = author.id, "Successfully created author");
        Ok(author)
    }

    #[instrument(skip(self, tx), fields(author_id = id))]
    pub async fn delete_author(&self, tx: &TxHandle<'_>, id: i64) -> Result<(), DomainError> {
        if !self.authors.delete(tx, id).await? {
            return Err(DomainError::not_found("Author", id));
        }
        Ok(())
    }

    async fn require_author(&self, tx: &TxHandle<'_>, id: i64) -> Result<Author, DomainError> {
        self.authors
            .get(tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Author", id))
    }
}

// Categories
impl<B: BooksRepository, A: AuthorsRepository, C: CategoriesRepository> CatalogService<B, A, C> {
    #[instrument(skip_all, fields(filters = filters.len(), page = pagination.page()))]
    pub async fn list_categories(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<CategoryFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Category>, DomainError> {
        self.categories.list(tx, filters, pagination).await
    }

    /// Categories of one book.
    #[instrument(skip(self, tx, filters, pagination), fields(filters = filters.len()))]
    pub async fn list_book_categories(
        &self,
        tx: &TxHandle<'_>,
        book_id: i64,
        filters: &[Filter<CategoryFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Category>, DomainError> {
        self.require_book(tx, book_id).await?;
        self.categories
            .list_by_book(tx, book_id, filters, pagination)
            .await
    }

    #[instrument(skip(self, tx, category), fields(name = %category.name))]
    pub async fn create_category(
        &self,
        tx: &TxHandle<'_>,
        category: NewCategory,
    ) -> Result<Category, DomainError> {
        require_text("name", &category.name, MAX_NAME_LEN)?;
        let category = self.categories.create(tx, category).await?;
        info!(category_id = category.id, "Successfully created category");
        Ok(category)
    }
}

fn validate_new_book(book: &NewBook) -> Result<(), DomainError> {
    require_text("title", &book.title, MAX_TITLE_LEN)?;
    require_text("isbn", &book.isbn, 17)?;
    validate_price(book.price)?;
    if has_duplicates(&book.author_ids) {
        return Err(DomainError::validation("author_ids", "contains duplicates"));
    }
    if has_duplicates(&book.category_ids) {
        return Err(DomainError::validation("category_ids", "contains duplicates"));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), DomainError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(DomainError::validation("price", "must be a non-negative number"))
    }
}

fn has_duplicates(ids: &[i64]) -> bool {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).any(|w| w[0] == w[1])
}
