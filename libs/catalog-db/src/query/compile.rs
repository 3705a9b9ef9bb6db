//! Filter → parameterized condition.

use catalog_query::{Filter, FilterField, FilterProperty, FilterValue};
use sea_orm::Value;
use sea_orm::sea_query::{ColumnRef, Expr, LikeExpr, SimpleExpr};

/// Escape character used for LIKE patterns produced by the filter parser.
pub const LIKE_ESCAPE: char = '\\';

/// Compiles one filter against `column`. Operands are always bound values.
///
/// # Panics
/// Panics when the filter's operator or operand type is not admitted by the field's allow-list
/// entry. The parser never produces such filters; reaching this is a bug in the caller.
#[must_use]
pub fn filter_expr<F: FilterField>(column: ColumnRef, filter: &Filter<F>) -> SimpleExpr {
    assert!(
        filter.is_permitted(),
        "filter on field '{}' with operator '{}' is not admitted by its allow-list: {:?}",
        filter.field.name(),
        filter.op(),
        filter.property,
    );

    let col = Expr::col(column);
    match &filter.property {
        FilterProperty::Eq(values) => match values.as_slice() {
            [single] => col.eq(bind(single)),
            many => col.is_in(many.iter().map(bind)),
        },
        FilterProperty::Gt(v) => col.gt(bind(v)),
        FilterProperty::Gte(v) => col.gte(bind(v)),
        FilterProperty::Lt(v) => col.lt(bind(v)),
        FilterProperty::Lte(v) => col.lte(bind(v)),
        FilterProperty::Like(pattern) => {
            col.like(LikeExpr::new(pattern.as_str()).escape(LIKE_ESCAPE))
        }
        FilterProperty::Between(lo, hi) => col.between(bind(lo), bind(hi)),
    }
}

/// Database value of a typed operand.
#[must_use]
pub fn bind(value: &FilterValue) -> Value {
    match value {
        FilterValue::String(s) | FilterValue::Enum(s) => Value::from(s.as_str()),
        FilterValue::Integer(i) => Value::from(*i),
        FilterValue::Float(f) => Value::from(*f),
        FilterValue::Date(d) => Value::from(*d),
    }
}
