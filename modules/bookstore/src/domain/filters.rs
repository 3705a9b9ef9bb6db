//! Allow-lists of the list endpoints: which fields a client may filter on, with which operators.

use catalog_query::{FieldKind, supported_filters};

use super::model::{BOOK_FORMATS, ROLES};

supported_filters! {
    pub enum BookFilterField {
        Title => "title": FieldKind::String => [Eq, Like],
        Isbn => "isbn": FieldKind::String => [Eq],
        ReleaseYear => "releaseYear": FieldKind::Integer,
        Price => "price": FieldKind::Float => [Gt, Gte, Lt, Lte, Between],
        Format => "format": FieldKind::Enum(BOOK_FORMATS),
        ReleasedOn => "releasedOn": FieldKind::Date,
    }
}

supported_filters! {
    pub enum AuthorFilterField {
        FirstName => "firstName": FieldKind::String,
        LastName => "lastName": FieldKind::String,
    }
}

supported_filters! {
    pub enum CategoryFilterField {
        Name => "name": FieldKind::String,
    }
}

supported_filters! {
    pub enum CustomerFilterField {
        FirstName => "firstName": FieldKind::String,
        LastName => "lastName": FieldKind::String,
        Email => "email": FieldKind::String,
    }
}

supported_filters! {
    pub enum AddressFilterField {
        City => "city": FieldKind::String,
        Country => "country": FieldKind::String => [Eq],
        PostalCode => "postalCode": FieldKind::String => [Eq, Like],
    }
}

supported_filters! {
    pub enum UserFilterField {
        Email => "email": FieldKind::String,
        Role => "role": FieldKind::Enum(ROLES),
    }
}
