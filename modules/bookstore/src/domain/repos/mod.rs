mod addresses_repo;
mod authors_repo;
mod books_repo;
mod categories_repo;
mod customers_repo;
mod users_repo;

pub use addresses_repo::AddressesRepository;
pub use authors_repo::AuthorsRepository;
pub use books_repo::BooksRepository;
pub use categories_repo::CategoriesRepository;
pub use customers_repo::CustomersRepository;
pub use users_repo::UsersRepository;
