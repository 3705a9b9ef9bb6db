//! `SeaORM` storage: entities, row mapping and repository implementations.

pub mod entity;

mod addresses_sea_repo;
mod authors_sea_repo;
mod books_sea_repo;
mod categories_sea_repo;
mod customers_sea_repo;
mod mapper;
mod query;
mod users_sea_repo;

pub use addresses_sea_repo::OrmAddressesRepository;
pub use authors_sea_repo::OrmAuthorsRepository;
pub use books_sea_repo::OrmBooksRepository;
pub use categories_sea_repo::OrmCategoriesRepository;
pub use customers_sea_repo::OrmCustomersRepository;
pub use users_sea_repo::OrmUsersRepository;
