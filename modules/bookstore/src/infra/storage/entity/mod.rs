pub mod address;
pub mod author;
pub mod book;
pub mod book_author;
pub mod book_category;
pub mod category;
pub mod customer;
pub mod user;
