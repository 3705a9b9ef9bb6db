//! Bookstore data access: books, authors, categories, users, customers and addresses.
//!
//! Layers, outermost first:
//! - [`api::BookstoreApi`] parses raw list query strings and runs each call in one unit of work.
//! - [`domain::service`] holds the business rules; every method takes the caller's
//!   [`catalog_db::TxHandle`].
//! - [`domain::repos`] are the persistence ports, implemented with `SeaORM` in
//!   [`infra::storage`].
//!
//! Schema creation is not part of this crate.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;

pub use api::BookstoreApi;
pub use config::{BookstoreConfig, ConfigError, ENV_PREFIX};
pub use domain::error::DomainError;
pub use domain::filters::{
    AddressFilterField, AuthorFilterField, BookFilterField, CategoryFilterField,
    CustomerFilterField, UserFilterField,
};
pub use domain::model::{
    Address, Author, Book, BookDetails, BookFormat, BookPatch, Category, Customer,
    CustomerDetails, NewAddress, NewAuthor, NewBook, NewCategory, NewCustomer, NewUser, Role, User,
};
