//! Parsing whole list requests as they arrive in a URL query string.

use catalog_query::{
    FieldKind, FilterOp, FilterProperty, FilterValue, ListQuery, ListRequest, Problem, QueryError,
    QueryLimits, supported_filters,
};
use http::StatusCode;

supported_filters! {
    pub enum CustomerField {
        LastName => "lastName": FieldKind::String,
        Age => "age": FieldKind::Integer => [Gt, Gte, Lt, Lte],
    }
}

#[test]
fn parses_filter_and_pagination_from_query_string() {
    let request: ListRequest<CustomerField> = ListRequest::from_query_str(
        r#"filter=["lastName||eq||Smith,Jones","age||gte||30"]&page=2&limit=5&sort=ignored"#,
        &QueryLimits::default(),
    )
    .unwrap();

    assert_eq!(request.filters.len(), 2);
    assert_eq!(request.filters[0].field, CustomerField::LastName);
    assert_eq!(
        request.filters[0].property,
        FilterProperty::Eq(vec![
            FilterValue::String("Smith".to_owned()),
            FilterValue::String("Jones".to_owned()),
        ])
    );
    assert_eq!(request.filters[1].op(), FilterOp::Gte);
    assert_eq!(request.pagination.page(), 2);
    assert_eq!(request.pagination.offset(), 5);
}

#[test]
fn percent_encoded_filter_is_decoded() {
    let request: ListRequest<CustomerField> = ListRequest::from_query_str(
        "?filter=%5B%22age%7C%7Clt%7C%7C40%22%5D",
        &QueryLimits::default(),
    )
    .unwrap();
    assert_eq!(
        request.filters[0].property,
        FilterProperty::Lt(FilterValue::Integer(40))
    );
}

#[test]
fn missing_parameters_fall_back_to_defaults() {
    let limits = QueryLimits::default().with_default_limit(25);
    let request: ListRequest<CustomerField> = ListRequest::from_query_str("", &limits).unwrap();
    assert!(request.filters.is_empty());
    assert_eq!(request.pagination.limit(), 25);
    assert_eq!(request.pagination.page(), 1);
    assert_eq!(request, ListRequest::unfiltered(&limits));
}

#[test]
fn client_errors_become_bad_request_problems() {
    let query = ListQuery::from_query_str(r#"filter=["email||eq||x"]"#).unwrap();
    let err = query
        .parse::<CustomerField>(&QueryLimits::default())
        .unwrap_err();
    assert_eq!(err, QueryError::UnsupportedFilterField("email".to_owned()));

    let problem = Problem::from(err);
    assert_eq!(problem.status, StatusCode::BAD_REQUEST);
}

#[test]
fn filter_errors_win_over_pagination_errors() {
    let err = ListRequest::<CustomerField>::from_query_str(
        r#"filter=["age||like||3"]&page=0"#,
        &QueryLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedFilterOperator { .. }));
}
