use catalog_query::Page;

use crate::domain::error::DomainError;
use crate::domain::model::{Address, Author, Book, Category, Customer, User};
use crate::infra::storage::entity::{address, author, book, category, customer, user};

/// Books store their format as text; an unknown value is reported, not guessed.
impl TryFrom<book::Model> for Book {
    type Error = DomainError;

    fn try_from(m: book::Model) -> Result<Self, Self::Error> {
        let format = m
            .format
            .parse()
            .map_err(|reason: String| DomainError::corrupt("Book", m.id, &reason))?;
        Ok(Self {
            id: m.id,
            title: m.title,
            isbn: m.isbn,
            release_year: m.release_year,
            price: m.price,
            format,
            released_on: m.released_on,
        })
    }
}

impl TryFrom<user::Model> for User {
    type Error = DomainError;

    fn try_from(m: user::Model) -> Result<Self, Self::Error> {
        let role = m
            .role
            .parse()
            .map_err(|reason: String| DomainError::corrupt("User", m.id, &reason))?;
        Ok(Self {
            id: m.id,
            email: m.email,
            password_hash: m.password_hash,
            role,
        })
    }
}

impl From<author::Model> for Author {
    fn from(m: author::Model) -> Self {
        Self {
            id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
        }
    }
}

impl From<category::Model> for Category {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

impl From<customer::Model> for Customer {
    fn from(m: customer::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            phone: m.phone,
        }
    }
}

impl From<address::Model> for Address {
    fn from(m: address::Model) -> Self {
        Self {
            id: m.id,
            customer_id: m.customer_id,
            street: m.street,
            city: m.city,
            country: m.country,
            postal_code: m.postal_code,
        }
    }
}

/// Page of rows converted item by item; the first conversion failure wins.
pub fn try_page<M, T>(page: Page<M>) -> Result<Page<T>, DomainError>
where
    T: TryFrom<M, Error = DomainError>,
{
    let items = page
        .items
        .into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        items,
        page: page.page,
        limit: page.limit,
        total: page.total,
    })
}
