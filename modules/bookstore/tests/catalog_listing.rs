#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use bookstore::domain::service::CatalogService;
use bookstore::infra::storage::{
    OrmAuthorsRepository, OrmBooksRepository, OrmCategoriesRepository,
};
use bookstore::{Book, BookFormat, BookPatch, DomainError, NewBook};
use catalog_db::UnitOfWorkFactory;
use catalog_query::QueryError;
use common::{author, book, category, store};
use http::StatusCode;
use tracing_test::traced_test;

type Catalog = CatalogService<OrmBooksRepository, OrmAuthorsRepository, OrmCategoriesRepository>;

fn catalog_service() -> Arc<Catalog> {
    Arc::new(CatalogService::new(
        Arc::new(OrmBooksRepository),
        Arc::new(OrmAuthorsRepository),
        Arc::new(OrmCategoriesRepository),
    ))
}

fn years(books: &[Book]) -> Vec<i32> {
    books.iter().map(|b| b.release_year).collect()
}

fn titles(books: &[Book]) -> Vec<&str> {
    books.iter().map(|b| b.title.as_str()).collect()
}

#[tokio::test]
async fn release_year_below_filter_keeps_insertion_order() {
    let s = store().await;
    for (title, year) in [("Jackie Brown", 1997), ("Fight Club", 1999), ("Sin City", 2005)] {
        s.api.create_book(book(title, year, 20.0)).await.unwrap();
    }

    let page = s
        .api
        .list_books(r#"filter=["releaseYear||lt||2000"]"#)
        .await
        .unwrap();

    assert_eq!(years(&page.items), vec![1997, 1999]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn price_between_is_inclusive_range() {
    let s = store().await;
    for (title, price) in [("Sixty", 60.0), ("Fifty", 50.0), ("Ten", 10.0)] {
        s.api.create_book(book(title, 2001, price)).await.unwrap();
    }

    let page = s
        .api
        .list_books(r#"filter=["price||between||40,80"]"#)
        .await
        .unwrap();

    assert_eq!(titles(&page.items), vec!["Sixty", "Fifty"]);
}

#[tokio::test]
#[traced_test]
async fn unknown_field_is_rejected_before_any_query() {
    let s = store().await;

    let problem = s
        .api
        .list_books(r#"filter=["bogus||eq||x"]"#)
        .await
        .unwrap_err();

    assert_eq!(problem.status, StatusCode::BAD_REQUEST);
    assert_eq!(problem.code, "unsupported_filter_field");
    assert!(problem.detail.contains("bogus"));
    assert!(!logs_contain("began transaction"));
}

#[tokio::test]
async fn first_page_of_two_over_three_rows() {
    let s = store().await;
    for (title, year) in [("A", 2001), ("B", 2002), ("C", 2003)] {
        s.api.create_book(book(title, year, 5.0)).await.unwrap();
    }

    let page = s.api.list_books("page=1&limit=2").await.unwrap();
    assert_eq!(titles(&page.items), vec!["A", "B"]);
    assert_eq!(page.total, 3);
    assert!(page.has_next());

    let page = s.api.list_books("page=2&limit=2").await.unwrap();
    assert_eq!(titles(&page.items), vec!["C"]);
}

#[tokio::test]
async fn limit_above_maximum_is_a_bad_request() {
    let s = store().await;
    let problem = s.api.list_books("limit=1000").await.unwrap_err();
    assert_eq!(problem.status, StatusCode::BAD_REQUEST);
    assert_eq!(problem.title, "Invalid Pagination");
}

#[tokio::test]
async fn like_matches_substrings_and_treats_wildcards_literally() {
    let s = store().await;
    for title in ["Crime and Punishment", "Crimes 100% True", "Poems"] {
        s.api.create_book(book(title, 1990, 12.0)).await.unwrap();
    }

    let page = s
        .api
        .list_books(r#"filter=["title||like||crime"]"#)
        .await
        .unwrap();
    assert_eq!(
        titles(&page.items),
        vec!["Crime and Punishment", "Crimes 100% True"]
    );

    let page = s
        .api
        .list_books(r#"filter=["title||like||100%"]"#)
        .await
        .unwrap();
    assert_eq!(titles(&page.items), vec!["Crimes 100% True"]);
}

#[tokio::test]
async fn enum_and_date_filters_combine() {
    let s = store().await;
    let mut ebook = book("Digital", 2010, 3.0);
    ebook.format = BookFormat::Ebook;
    s.api.create_book(ebook).await.unwrap();
    s.api.create_book(book("Printed", 2010, 9.0)).await.unwrap();
    let mut old_ebook = book("Early Digital", 1999, 3.0);
    old_ebook.format = BookFormat::Ebook;
    s.api.create_book(old_ebook).await.unwrap();

    let page = s
        .api
        .list_books(r#"filter=["format||eq||ebook","releasedOn||gte||2000-01-01"]"#)
        .await
        .unwrap();
    assert_eq!(titles(&page.items), vec!["Digital"]);
}

#[tokio::test]
async fn relationship_scoped_lists() {
    let s = store().await;
    let christie = s.api.create_author(author("Agatha", "Christie")).await.unwrap();
    let doyle = s.api.create_author(author("Arthur", "Doyle")).await.unwrap();
    let crime = s.api.create_category(category("crime")).await.unwrap();
    let classic = s.api.create_category(category("classic")).await.unwrap();

    let styles = s
        .api
        .create_book(NewBook {
            author_ids: vec![christie.id],
            category_ids: vec![crime.id, classic.id],
            ..book("The Mysterious Affair at Styles", 1920, 8.0)
        })
        .await
        .unwrap();
    s.api
        .create_book(NewBook {
            author_ids: vec![christie.id],
            category_ids: vec![crime.id],
            ..book("Murder on the Orient Express", 1934, 11.0)
        })
        .await
        .unwrap();
    s.api
        .create_book(NewBook {
            author_ids: vec![doyle.id],
            category_ids: vec![classic.id],
            ..book("A Study in Scarlet", 1887, 6.0)
        })
        .await
        .unwrap();

    assert_eq!(styles.authors, vec![christie.clone()]);
    assert_eq!(styles.categories.len(), 2);

    let by_christie = s.api.list_author_books(christie.id, "").await.unwrap();
    assert_eq!(by_christie.total, 2);
    let early = s
        .api
        .list_author_books(christie.id, r#"filter=["releaseYear||lt||1930"]"#)
        .await
        .unwrap();
    assert_eq!(titles(&early.items), vec!["The Mysterious Affair at Styles"]);

    let classics = s.api.list_category_books(classic.id, "").await.unwrap();
    assert_eq!(
        titles(&classics.items),
        vec!["The Mysterious Affair at Styles", "A Study in Scarlet"]
    );

    let categories = s
        .api
        .list_book_categories(styles.book.id, r#"filter=["name||eq||crime"]"#)
        .await
        .unwrap();
    assert_eq!(categories.items, vec![crime]);

    let problem = s.api.list_author_books(999, "").await.unwrap_err();
    assert_eq!(problem.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_author_is_not_found_and_stores_nothing() {
    let s = store().await;
    let problem = s
        .api
        .create_book(NewBook {
            author_ids: vec![42],
            ..book("Orphan", 2000, 1.0)
        })
        .await
        .unwrap_err();
    assert_eq!(problem.status, StatusCode::NOT_FOUND);

    let page = s.api.list_books("").await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn failure_after_book_insert_rolls_back_book_and_links() {
    let s = store().await;
    let poe = s.api.create_author(author("Edgar", "Poe")).await.unwrap().id;
    let gothic = s.api.create_category(category("gothic")).await.unwrap().id;
    let factory = UnitOfWorkFactory::new(&s.db);
    let catalog = catalog_service();

    let err = factory
        .run::<(), DomainError, _>(move |tx| {
            Box::pin(async move {
                let created = catalog
                    .create_book(
                        &tx,
                        NewBook {
                            author_ids: vec![poe],
                            category_ids: vec![gothic],
                            ..book("The Raven", 1845, 4.0)
                        },
                    )
                    .await?;
                assert_eq!(created.authors.len(), 1);
                // Duplicate category name: rejected by the database after the book rows exist.
                catalog.create_category(&tx, category("gothic")).await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Conflict { .. }), "{err}");
    assert_eq!(s.api.list_books("").await.unwrap().total, 0);
    assert_eq!(s.api.list_author_books(poe, "").await.unwrap().total, 0);
    assert_eq!(s.api.list_category_books(gothic, "").await.unwrap().total, 0);
}

#[tokio::test]
async fn author_lookup_and_delete_keep_books() {
    let s = store().await;
    let shelley = s.api.create_author(author("Mary", "Shelley")).await.unwrap();
    let created = s
        .api
        .create_book(NewBook {
            author_ids: vec![shelley.id],
            ..book("Frankenstein", 1818, 7.0)
        })
        .await
        .unwrap();

    assert_eq!(s.api.get_author(shelley.id).await.unwrap(), shelley);

    s.api.delete_author(shelley.id).await.unwrap();
    let problem = s.api.get_author(shelley.id).await.unwrap_err();
    assert_eq!(problem.status, StatusCode::NOT_FOUND);
    let problem = s.api.delete_author(shelley.id).await.unwrap_err();
    assert_eq!(problem.status, StatusCode::NOT_FOUND);

    let details = s.api.get_book(created.book.id).await.unwrap();
    assert!(details.authors.is_empty());
}

#[tokio::test]
async fn page_beyond_addressable_offset_is_a_bad_request() {
    let s = store().await;
    let problem = s
        .api
        .list_books("page=100000000000000000&limit=100")
        .await
        .unwrap_err();
    assert_eq!(problem.status, StatusCode::BAD_REQUEST);
    assert_eq!(problem.code, "invalid_pagination_parameter");
}

#[tokio::test]
async fn update_and_delete_book() {
    let s = store().await;
    let created = s.api.create_book(book("Draft", 2020, 10.0)).await.unwrap();

    let updated = s
        .api
        .update_book(
            created.book.id,
            BookPatch {
                price: Some(12.5),
                ..BookPatch::default()
            },
        )
        .await
        .unwrap();
    assert!((updated.price - 12.5).abs() < f64::EPSILON);
    assert_eq!(updated.title, "Draft");
    assert_eq!(s.api.get_book(created.book.id).await.unwrap().book, updated);

    s.api.delete_book(created.book.id).await.unwrap();
    let problem = s.api.get_book(created.book.id).await.unwrap_err();
    assert_eq!(problem.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parse_errors_surface_as_query_errors() {
    use bookstore::BookFilterField;
    use catalog_query::{ListRequest, QueryLimits};

    let err = ListRequest::<BookFilterField>::from_query_str(
        r#"filter=["price||between||80,40"]"#,
        &QueryLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::InvalidRange { .. }));
}
