//! Request-boundary entry points.
//!
//! Each call parses its raw query string before touching the database, then runs all of its
//! service work in one fresh unit of work. Errors come back as RFC 9457 problems.

use std::sync::Arc;

use catalog_db::{DbHandle, TxFuture, TxHandle, UnitOfWorkFactory};
use catalog_query::{FilterField, ListRequest, Page, Problem, QueryLimits};
use tracing::instrument;

use crate::config::BookstoreConfig;
use crate::domain::error::DomainError;
use crate::domain::filters::{
    AddressFilterField, AuthorFilterField, BookFilterField, CategoryFilterField,
    CustomerFilterField, UserFilterField,
};
use crate::domain::model::{
    Address, Author, Book, BookDetails, BookPatch, Category, Customer, CustomerDetails,
    NewAddress, NewAuthor, NewBook, NewCategory, NewCustomer, NewUser, User,
};
use crate::domain::service::{CatalogService, CustomersService, UsersService};
use crate::infra::storage::{
    OrmAddressesRepository, OrmAuthorsRepository, OrmBooksRepository, OrmCategoriesRepository,
    OrmCustomersRepository, OrmUsersRepository,
};

type Catalog = CatalogService<OrmBooksRepository, OrmAuthorsRepository, OrmCategoriesRepository>;
type Customers = CustomersService<OrmCustomersRepository, OrmAddressesRepository>;
type Users = UsersService<OrmUsersRepository>;

/// Bookstore operations as the HTTP layer calls them.
#[derive(Clone)]
pub struct BookstoreApi {
    uow: UnitOfWorkFactory,
    limits: QueryLimits,
    catalog: Arc<Catalog>,
    customers: Arc<Customers>,
    users: Arc<Users>,
}

impl BookstoreApi {
    /// Wires the SeaORM repositories over `db` using the transaction settings and limits of
    /// `config`.
    #[must_use]
    pub fn new(db: &DbHandle, config: &BookstoreConfig) -> Self {
        let uow = UnitOfWorkFactory::new(db).with_tx_config(config.database.transaction);
        Self::with_factory(uow, config.limits.clone())
    }

    #[must_use]
    pub fn with_factory(uow: UnitOfWorkFactory, limits: QueryLimits) -> Self {
        Self {
            uow,
            limits,
            catalog: Arc::new(CatalogService::new(
                Arc::new(OrmBooksRepository),
                Arc::new(OrmAuthorsRepository),
                Arc::new(OrmCategoriesRepository),
            )),
            customers: Arc::new(CustomersService::new(
                Arc::new(OrmCustomersRepository),
                Arc::new(OrmAddressesRepository),
            )),
            users: Arc::new(UsersService::new(Arc::new(OrmUsersRepository))),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    fn list_request<F: FilterField>(&self, query: &str) -> Result<ListRequest<F>, Problem> {
        Ok(ListRequest::from_query_str(query, &self.limits)?)
    }

    async fn run<T, F>(&self, f: F) -> Result<T, Problem>
    where
        F: for<'a> FnOnce(TxHandle<'a>) -> TxFuture<'a, T, DomainError> + Send,
        T: Send,
    {
        self.uow.run(f).await.map_err(Problem::from)
    }
}

// Books
impl BookstoreApi {
    /// `GET /books?filter=[...]&page=&limit=`
    ///
    /// # Errors
    /// 400 for malformed filters or pagination, 5xx for database failures.
    #[instrument(skip(self))]
    pub async fn list_books(&self, query: &str) -> Result<Page<Book>, Problem> {
        let request: ListRequest<BookFilterField> = self.list_request(query)?;
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| {
            Box::pin(async move {
                catalog
                    .list_books(&tx, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }

    /// # Errors
    /// 404 when the book does not exist.
    pub async fn get_book(&self, id: i64) -> Result<BookDetails, Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.get_book(&tx, id).await }))
            .await
    }

    /// # Errors
    /// 422 for invalid fields, 404 for unknown authors or categories.
    pub async fn create_book(&self, book: NewBook) -> Result<BookDetails, Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.create_book(&tx, book).await }))
            .await
    }

    /// # Errors
    /// 404 when the book does not exist, 422 for invalid fields.
    pub async fn update_book(&self, id: i64, patch: BookPatch) -> Result<Book, Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.update_book(&tx, id, patch).await }))
            .await
    }

    /// # Errors
    /// 404 when the book does not exist.
    pub async fn delete_book(&self, id: i64) -> Result<(), Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.delete_book(&tx, id).await }))
            .await
    }

    /// `GET /books/{id}/categories`
    ///
    /// # Errors
    /// 400 for malformed query parameters, 404 when the book does not exist.
    #[instrument(skip(self))]
    pub async fn list_book_categories(
        &self,
        book_id: i64,
        query: &str,
    ) -> Result<Page<Category>, Problem> {
        let request: ListRequest<CategoryFilterField> = self.list_request(query)?;
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| {
            Box::pin(async move {
                catalog
                    .list_book_categories(&tx, book_id, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }
}

// Authors and categories
impl BookstoreApi {
    /// # Errors
    /// 400 for malformed query parameters.
    #[instrument(skip(self))]
    pub async fn list_authors(&self, query: &str) -> Result<Page<Author>, Problem> {
        let request: ListRequest<AuthorFilterField> = self.list_request(query)?;
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| {
            Box::pin(async move {
                catalog
                    .list_authors(&tx, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }

    /// `GET /authors/{id}/books`
    ///
    /// # Errors
    /// 400 for malformed query parameters, 404 when the author does not exist.
    #[instrument(skip(self))]
    pub async fn list_author_books(
        &self,
        author_id: i64,
        query: &str,
    ) -> Result<Page<Book>, Problem> {
        let request: ListRequest<BookFilterField> = self.list_request(query)?;
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| {
            Box::pin(async move {
                catalog
                    .list_author_books(&tx, author_id, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }

    /// # Errors
    /// 404 when the author does not exist.
    pub async fn get_author(&self, id: i64) -> Result<Author, Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.get_author(&tx, id).await }))
            .await
    }

    /// # Errors
    /// 422 for blank names.
    pub async fn create_author(&self, author: NewAuthor) -> Result<Author, Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.create_author(&tx, author).await }))
            .await
    }

    /// Removes the author and its book links; the books themselves stay.
    ///
    /// # Errors
    /// 404 when the author does not exist.
    pub async fn delete_author(&self, id: i64) -> Result<(), Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.delete_author(&tx, id).await }))
            .await
    }

    /// # Errors
    /// 400 for malformed query parameters.
    #[instrument(skip(self))]
    pub async fn list_categories(&self, query: &str) -> Result<Page<Category>, Problem> {
        let request: ListRequest<CategoryFilterField> = self.list_request(query)?;
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| {
            Box::pin(async move {
                catalog
                    .list_categories(&tx, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }

    /// `GET /categories/{id}/books`
    ///
    /// # Errors
    /// 400 for malformed query parameters, 404 when the category does not exist.
    #[instrument(skip(self))]
    pub async fn list_category_books(
        &self,
        category_id: i64,
        query: &str,
    ) -> Result<Page<Book>, Problem> {
        let request: ListRequest<BookFilterField> = self.list_request(query)?;
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| {
            Box::pin(async move {
                catalog
                    .list_category_books(&tx, category_id, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }

    /// # Errors
    /// 409 when the name is taken, 422 for a blank name.
    pub async fn create_category(&self, category: NewCategory) -> Result<Category, Problem> {
        let catalog = Arc::clone(&self.catalog);
        self.run(move |tx| Box::pin(async move { catalog.create_category(&tx, category).await }))
            .await
    }
}

// Customers
impl BookstoreApi {
    /// Creates a customer and its addresses; either all rows are stored or none.
    ///
    /// # Errors
    /// 422 for invalid fields.
    pub async fn create_customer(&self, customer: NewCustomer) -> Result<CustomerDetails, Problem> {
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| {
            Box::pin(async move { customers.create_customer(&tx, customer).await })
        })
        .await
    }

    /// # Errors
    /// 404 when the customer does not exist.
    pub async fn get_customer(&self, id: i64) -> Result<CustomerDetails, Problem> {
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| Box::pin(async move { customers.get_customer(&tx, id).await }))
            .await
    }

    /// # Errors
    /// 404 when the customer does not exist, 422 for invalid fields.
    pub async fn update_customer(&self, customer: Customer) -> Result<Customer, Problem> {
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| {
            Box::pin(async move { customers.update_customer(&tx, customer).await })
        })
        .await
    }

    /// Deletes the customer together with its addresses.
    ///
    /// # Errors
    /// 404 when the customer does not exist.
    pub async fn delete_customer(&self, id: i64) -> Result<(), Problem> {
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| Box::pin(async move { customers.delete_customer(&tx, id).await }))
            .await
    }

    /// # Errors
    /// 400 for malformed query parameters.
    #[instrument(skip(self))]
    pub async fn list_customers(&self, query: &str) -> Result<Page<Customer>, Problem> {
        let request: ListRequest<CustomerFilterField> = self.list_request(query)?;
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| {
            Box::pin(async move {
                customers
                    .list_customers(&tx, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }

    /// `GET /customers/{id}/addresses`
    ///
    /// # Errors
    /// 400 for malformed query parameters, 404 when the customer does not exist.
    #[instrument(skip(self))]
    pub async fn list_customer_addresses(
        &self,
        customer_id: i64,
        query: &str,
    ) -> Result<Page<Address>, Problem> {
        let request: ListRequest<AddressFilterField> = self.list_request(query)?;
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| {
            Box::pin(async move {
                customers
                    .list_customer_addresses(
                        &tx,
                        customer_id,
                        &request.filters,
                        &request.pagination,
                    )
                    .await
            })
        })
        .await
    }

    /// # Errors
    /// 404 when the customer does not exist, 422 for invalid fields.
    pub async fn add_address(
        &self,
        customer_id: i64,
        address: NewAddress,
    ) -> Result<Address, Problem> {
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| {
            Box::pin(async move { customers.add_address(&tx, customer_id, address).await })
        })
        .await
    }

    /// # Errors
    /// 404 when the address does not exist or belongs to another customer.
    pub async fn remove_address(&self, customer_id: i64, address_id: i64) -> Result<(), Problem> {
        let customers = Arc::clone(&self.customers);
        self.run(move |tx| {
            Box::pin(async move {
                customers
                    .remove_address(&tx, customer_id, address_id)
                    .await
            })
        })
        .await
    }
}

// Users
impl BookstoreApi {
    /// # Errors
    /// 409 when the email is already registered, 422 for invalid fields.
    pub async fn register_user(&self, user: NewUser) -> Result<User, Problem> {
        let users = Arc::clone(&self.users);
        self.run(move |tx| Box::pin(async move { users.register(&tx, user).await }))
            .await
    }

    /// # Errors
    /// 404 when the user does not exist.
    pub async fn get_user(&self, id: i64) -> Result<User, Problem> {
        let users = Arc::clone(&self.users);
        self.run(move |tx| Box::pin(async move { users.get_user(&tx, id).await }))
            .await
    }

    /// # Errors
    /// 404 when the user does not exist.
    pub async fn delete_user(&self, id: i64) -> Result<(), Problem> {
        let users = Arc::clone(&self.users);
        self.run(move |tx| Box::pin(async move { users.delete_user(&tx, id).await }))
            .await
    }

    /// # Errors
    /// Database failures only; an unknown email is `Ok(None)`.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Problem> {
        let users = Arc::clone(&self.users);
        let email = email.to_owned();
        self.run(move |tx| Box::pin(async move { users.find_by_email(&tx, &email).await }))
            .await
    }

    /// # Errors
    /// 400 for malformed query parameters.
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: &str) -> Result<Page<User>, Problem> {
        let request: ListRequest<UserFilterField> = self.list_request(query)?;
        let users = Arc::clone(&self.users);
        self.run(move |tx| {
            Box::pin(async move {
                users
                    .list_users(&tx, &request.filters, &request.pagination)
                    .await
            })
        })
        .await
    }
}
