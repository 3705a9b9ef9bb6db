//! Parser for the filter grammar: `["field||op||operand[,operand...]", ...]`.

use std::cmp::Ordering;

use tracing::debug;

use crate::QueryError;
use crate::filter::{Filter, FilterField, FilterOp, FilterProperty, FilterValue, like_contains};
use crate::limits::QueryLimits;

/// Separates field, operator and operands inside one entry.
pub const DELIMITER: &str = "||";

/// Separates operands of `eq` (IN list) and `between`.
pub const OPERAND_SEPARATOR: char = ',';

/// Parses the raw `filter` query parameter against the allow-list `F`.
///
/// An absent or blank expression yields no filters. Entries keep their input order.
///
/// # Errors
/// Returns a [`QueryError`] describing the first invalid entry, or a limit violation.
pub fn parse_filters<F: FilterField>(
    raw: Option<&str>,
    limits: &QueryLimits,
) -> Result<Vec<Filter<F>>, QueryError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };
    limits.validate_filter(raw)?;

    let entries: Vec<String> = serde_json::from_str(raw).map_err(|e| {
        QueryError::InvalidFilterSyntax(format!("expected a JSON array of strings: {e}"))
    })?;
    limits.validate_filter_count(entries.len())?;

    let filters = parse_filter_entries(&entries)?;
    debug!(count = filters.len(), "parsed filter expression");
    Ok(filters)
}

/// Parses already-decoded filter entries.
///
/// # Errors
/// Returns a [`QueryError`] describing the first invalid entry.
pub fn parse_filter_entries<F, S>(entries: &[S]) -> Result<Vec<Filter<F>>, QueryError>
where
    F: FilterField,
    S: AsRef<str>,
{
    entries.iter().map(|e| parse_entry(e.as_ref())).collect()
}

fn parse_entry<F: FilterField>(entry: &str) -> Result<Filter<F>, QueryError> {
    let parts: Vec<&str> = entry.split(DELIMITER).collect();
    let [field_name, op_token, operands] = parts.as_slice() else {
        return Err(syntax(entry));
    };
    let field_name = field_name.trim();
    let op_token = op_token.trim();
    if field_name.is_empty() || op_token.is_empty() || operands.is_empty() {
        return Err(syntax(entry));
    }

    let field = F::from_name(field_name)
        .ok_or_else(|| QueryError::UnsupportedFilterField(field_name.to_owned()))?;

    let op = FilterOp::from_token(op_token)
        .filter(|op| field.allows(*op))
        .ok_or_else(|| QueryError::UnsupportedFilterOperator {
            field: field.name().to_owned(),
            op: op_token.to_owned(),
        })?;

    // LIKE takes the whole tail as a single operand; commas are literal there.
    if op == FilterOp::Like {
        return Ok(Filter::new(field, FilterProperty::Like(like_contains(operands))));
    }

    let raw_values: Vec<&str> = operands.split(OPERAND_SEPARATOR).collect();
    if !op.arity().accepts(raw_values.len()) {
        return Err(count_error(field, op, raw_values.len()));
    }

    let values = raw_values
        .into_iter()
        .map(|raw| coerce(field, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let property = match op {
        FilterOp::Eq => FilterProperty::Eq(values),
        FilterOp::Gt => FilterProperty::Gt(single(field, op, values)?),
        FilterOp::Gte => FilterProperty::Gte(single(field, op, values)?),
        FilterOp::Lt => FilterProperty::Lt(single(field, op, values)?),
        FilterOp::Lte => FilterProperty::Lte(single(field, op, values)?),
        FilterOp::Between => {
            let [lo, hi] = exact::<F, 2>(field, op, values)?;
            if lo.compare(&hi) == Some(Ordering::Greater) {
                return Err(QueryError::InvalidRange {
                    field: field.name().to_owned(),
                });
            }
            FilterProperty::Between(lo, hi)
        }
        FilterOp::Like => FilterProperty::Like(like_contains(operands)),
    };

    Ok(Filter::new(field, property))
}

fn coerce<F: FilterField>(field: F, raw: &str) -> Result<FilterValue, QueryError> {
    FilterValue::coerce(field.kind(), raw).ok_or_else(|| QueryError::InvalidFilterOperandType {
        field: field.name().to_owned(),
        kind: field.kind(),
        value: raw.to_owned(),
    })
}

fn single<F: FilterField>(
    field: F,
    op: FilterOp,
    values: Vec<FilterValue>,
) -> Result<FilterValue, QueryError> {
    let [value] = exact::<F, 1>(field, op, values)?;
    Ok(value)
}

fn exact<F: FilterField, const N: usize>(
    field: F,
    op: FilterOp,
    values: Vec<FilterValue>,
) -> Result<[FilterValue; N], QueryError> {
    values
        .try_into()
        .map_err(|rest: Vec<FilterValue>| count_error(field, op, rest.len()))
}

fn count_error<F: FilterField>(field: F, op: FilterOp, got: usize) -> QueryError {
    QueryError::InvalidOperandCount {
        field: field.name().to_owned(),
        op,
        expected: op.arity().describe(),
        got,
    }
}

fn syntax(entry: &str) -> QueryError {
    QueryError::InvalidFilterSyntax(format!(
        "expected 'field{DELIMITER}operator{DELIMITER}operand', got '{entry}'"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldKind;
    use chrono::NaiveDate;

    const FORMATS: &[&str] = &["hardcover", "paperback", "ebook"];

    crate::supported_filters! {
        enum BookField {
            Title => "title": FieldKind::String,
            ReleaseYear => "releaseYear": FieldKind::Integer,
            Price => "price": FieldKind::Float => [Gte, Lte, Between],
            Format => "format": FieldKind::Enum(FORMATS),
            ReleasedOn => "releasedOn": FieldKind::Date,
        }
    }

    fn parse(raw: &str) -> Result<Vec<Filter<BookField>>, QueryError> {
        parse_filters(Some(raw), &QueryLimits::default())
    }

    #[test]
    fn empty_input_yields_no_filters() {
        let limits = QueryLimits::default();
        assert!(parse_filters::<BookField>(None, &limits).unwrap().is_empty());
        assert!(parse_filters::<BookField>(Some("  "), &limits).unwrap().is_empty());
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn parses_in_input_order() {
        let filters = parse(r#"["title||like||crime","releaseYear||lt||2006"]"#).unwrap();
        assert_eq!(
            filters,
            vec![
                Filter::new(BookField::Title, FilterProperty::Like("%crime%".to_owned())),
                Filter::new(
                    BookField::ReleaseYear,
                    FilterProperty::Lt(FilterValue::Integer(2006))
                ),
            ]
        );
    }

    #[test]
    fn eq_with_several_operands_is_an_in_list() {
        let filters = parse(r#"["releaseYear||eq||1997,1999"]"#).unwrap();
        assert_eq!(
            filters[0].property,
            FilterProperty::Eq(vec![FilterValue::Integer(1997), FilterValue::Integer(1999)])
        );
    }

    #[test]
    fn like_operand_is_escaped_and_keeps_commas() {
        let filters = parse(r#"["title||like||50%, off_"]"#).unwrap();
        assert_eq!(
            filters[0].property,
            FilterProperty::Like("%50\\%, off\\_%".to_owned())
        );
    }

    #[test]
    fn malformed_structure_is_a_syntax_error() {
        for raw in [
            r#"["title||eq"]"#,
            r#"["title||eq||a||b"]"#,
            r#"["||eq||a"]"#,
            r#"["title||eq||"]"#,
            r#""title||eq||a""#,
            "not json",
        ] {
            assert!(
                matches!(parse(raw), Err(QueryError::InvalidFilterSyntax(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert_eq!(
            parse(r#"["bogus||eq||x"]"#),
            Err(QueryError::UnsupportedFilterField("bogus".to_owned()))
        );
    }

    #[test]
    fn operator_not_in_allow_list_is_rejected() {
        assert!(matches!(
            parse(r#"["price||gt||10"]"#),
            Err(QueryError::UnsupportedFilterOperator { ref op, .. }) if op == "gt"
        ));
        assert!(matches!(
            parse(r#"["releaseYear||like||19"]"#),
            Err(QueryError::UnsupportedFilterOperator { .. })
        ));
        assert!(matches!(
            parse(r#"["title||ne||x"]"#),
            Err(QueryError::UnsupportedFilterOperator { .. })
        ));
    }

    #[test]
    fn operand_type_is_checked() {
        assert!(matches!(
            parse(r#"["releaseYear||lt||soon"]"#),
            Err(QueryError::InvalidFilterOperandType { .. })
        ));
        assert!(matches!(
            parse(r#"["format||eq||scroll"]"#),
            Err(QueryError::InvalidFilterOperandType { .. })
        ));
        assert!(matches!(
            parse(r#"["releasedOn||gt||yesterday"]"#),
            Err(QueryError::InvalidFilterOperandType { .. })
        ));
    }

    #[test]
    fn operand_counts_are_enforced() {
        assert!(matches!(
            parse(r#"["price||between||40"]"#),
            Err(QueryError::InvalidOperandCount { got: 1, .. })
        ));
        assert!(matches!(
            parse(r#"["price||between||1,2,3"]"#),
            Err(QueryError::InvalidOperandCount { got: 3, .. })
        ));
        assert!(matches!(
            parse(r#"["releaseYear||gt||1,2"]"#),
            Err(QueryError::InvalidOperandCount { got: 2, .. })
        ));
    }

    #[test]
    fn between_requires_ordered_bounds() {
        assert_eq!(
            parse(r#"["price||between||80,40"]"#),
            Err(QueryError::InvalidRange {
                field: "price".to_owned()
            })
        );
        let filters = parse(r#"["price||between||40,40"]"#).unwrap();
        assert_eq!(
            filters[0].property,
            FilterProperty::Between(FilterValue::Float(40.0), FilterValue::Float(40.0))
        );
    }

    #[test]
    fn dates_and_enums_are_typed() {
        let filters = parse(r#"["releasedOn||gte||2001-09-11","FORMAT||eq||Ebook"]"#).unwrap();
        assert_eq!(filters[0].field, BookField::ReleasedOn);
        assert_eq!(
            filters[0].property,
            FilterProperty::Gte(FilterValue::Date(
                NaiveDate::from_ymd_opt(2001, 9, 11).unwrap()
            ))
        );
        assert_eq!(
            filters[1].property,
            FilterProperty::Eq(vec![FilterValue::Enum("ebook".to_owned())])
        );
    }

    #[test]
    fn limits_are_applied_before_parsing_entries() {
        let limits = QueryLimits::new().with_max_filters(1);
        assert_eq!(
            parse_filters::<BookField>(Some(r#"["title||eq||a","title||eq||b"]"#), &limits),
            Err(QueryError::TooManyFilters { max: 1 })
        );
    }
}
