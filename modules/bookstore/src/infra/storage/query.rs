//! Column each allow-listed filter field compiles against.

use catalog_db::QueryEntity;
use catalog_db::query::column_of;
use sea_orm::sea_query::ColumnRef;

use crate::domain::filters::{
    AddressFilterField, AuthorFilterField, BookFilterField, CategoryFilterField,
    CustomerFilterField, UserFilterField,
};
use crate::infra::storage::entity::{address, author, book, category, customer, user};

impl QueryEntity<BookFilterField> for book::Entity {
    fn filter_column(field: BookFilterField) -> ColumnRef {
        column_of::<Self>(match field {
            BookFilterField::Title => book::Column::Title,
            BookFilterField::Isbn => book::Column::Isbn,
            BookFilterField::ReleaseYear => book::Column::ReleaseYear,
            BookFilterField::Price => book::Column::Price,
            BookFilterField::Format => book::Column::Format,
            BookFilterField::ReleasedOn => book::Column::ReleasedOn,
        })
    }

    fn insertion_order() -> book::Column {
        book::Column::Id
    }
}

impl QueryEntity<AuthorFilterField> for author::Entity {
    fn filter_column(field: AuthorFilterField) -> ColumnRef {
        column_of::<Self>(match field {
            AuthorFilterField::FirstName => author::Column::FirstName,
            AuthorFilterField::LastName => author::Column::LastName,
        })
    }

    fn insertion_order() -> author::Column {
        author::Column::Id
    }
}

impl QueryEntity<CategoryFilterField> for category::Entity {
    fn filter_column(field: CategoryFilterField) -> ColumnRef {
        match field {
            CategoryFilterField::Name => column_of::<Self>(category::Column::Name),
        }
    }

    fn insertion_order() -> category::Column {
        category::Column::Id
    }
}

impl QueryEntity<CustomerFilterField> for customer::Entity {
    fn filter_column(field: CustomerFilterField) -> ColumnRef {
        column_of::<Self>(match field {
            CustomerFilterField::FirstName => customer::Column::FirstName,
            CustomerFilterField::LastName => customer::Column::LastName,
            CustomerFilterField::Email => customer::Column::Email,
        })
    }

    fn insertion_order() -> customer::Column {
        customer::Column::Id
    }
}

impl QueryEntity<AddressFilterField> for address::Entity {
    fn filter_column(field: AddressFilterField) -> ColumnRef {
        column_of::<Self>(match field {
            AddressFilterField::City => address::Column::City,
            AddressFilterField::Country => address::Column::Country,
            AddressFilterField::PostalCode => address::Column::PostalCode,
        })
    }

    fn insertion_order() -> address::Column {
        address::Column::Id
    }
}

impl QueryEntity<UserFilterField> for user::Entity {
    fn filter_column(field: UserFilterField) -> ColumnRef {
        column_of::<Self>(match field {
            UserFilterField::Email => user::Column::Email,
            UserFilterField::Role => user::Column::Role,
        })
    }

    fn insertion_order() -> user::Column {
        user::Column::Id
    }
}
