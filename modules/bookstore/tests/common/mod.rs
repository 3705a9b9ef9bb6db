#![allow(dead_code)]

use bookstore::{
    BookFormat, BookstoreApi, BookstoreConfig, NewAddress, NewAuthor, NewBook, NewCategory,
    NewCustomer,
};
use catalog_db::{ConnectOpts, DbHandle};
use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use tempfile::TempDir;

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL
    )",
    "CREATE TABLE customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT
    )",
    "CREATE TABLE addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        street TEXT NOT NULL,
        city TEXT NOT NULL,
        country TEXT NOT NULL,
        postal_code TEXT NOT NULL
    )",
    "CREATE TABLE authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL
    )",
    "CREATE TABLE categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        isbn TEXT NOT NULL,
        release_year INTEGER NOT NULL,
        price REAL NOT NULL,
        format TEXT NOT NULL,
        released_on TEXT NOT NULL
    )",
    "CREATE TABLE book_authors (
        book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
        PRIMARY KEY (book_id, author_id)
    )",
    "CREATE TABLE book_categories (
        book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        PRIMARY KEY (book_id, category_id)
    )",
];

pub struct TestStore {
    pub db: DbHandle,
    pub api: BookstoreApi,
    _dir: TempDir,
}

/// Fresh file-backed database with the bookstore schema.
pub async fn store() -> TestStore {
    let dir = tempfile::tempdir().expect("tempdir");
    let dsn = format!("sqlite://{}", dir.path().join("bookstore.db").display());
    let opts = ConnectOpts {
        max_conns: Some(2),
        ..ConnectOpts::default()
    };
    let db = DbHandle::connect(&dsn, opts).await.expect("connect");
    let conn = db.sea();
    for ddl in SCHEMA {
        conn.execute_unprepared(ddl).await.expect("schema");
    }
    let api = BookstoreApi::new(&db, &BookstoreConfig::default());
    TestStore { db, api, _dir: dir }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn book(title: &str, release_year: i32, price: f64) -> NewBook {
    NewBook {
        title: title.to_owned(),
        isbn: format!("978-{release_year}"),
        release_year,
        price,
        format: BookFormat::Paperback,
        released_on: date(release_year, 1, 15),
        author_ids: Vec::new(),
        category_ids: Vec::new(),
    }
}

pub fn author(first: &str, last: &str) -> NewAuthor {
    NewAuthor {
        first_name: first.to_owned(),
        last_name: last.to_owned(),
    }
}

pub fn category(name: &str) -> NewCategory {
    NewCategory {
        name: name.to_owned(),
    }
}

pub fn address(city: &str, postal_code: &str) -> NewAddress {
    NewAddress {
        street: "1 Main Street".to_owned(),
        city: city.to_owned(),
        country: "GB".to_owned(),
        postal_code: postal_code.to_owned(),
    }
}

pub fn customer(last_name: &str, addresses: Vec<NewAddress>) -> NewCustomer {
    NewCustomer {
        user_id: None,
        first_name: "Ada".to_owned(),
        last_name: last_name.to_owned(),
        email: format!("{}@example.com", last_name.to_lowercase()),
        phone: None,
        addresses,
    }
}
