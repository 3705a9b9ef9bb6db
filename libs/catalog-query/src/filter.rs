//! Typed filter model: allow-list fields, operators, operand values and conditions.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

/// Date operands are written as `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Value type of a filterable field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Date,
    /// Closed set of permitted values, compared case-insensitively on input.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    /// Operators that make sense for values of this kind.
    #[must_use]
    pub fn operators(self) -> &'static [FilterOp] {
        match self {
            Self::String => &[FilterOp::Eq, FilterOp::Like],
            Self::Integer | Self::Float | Self::Date => &[
                FilterOp::Eq,
                FilterOp::Gt,
                FilterOp::Gte,
                FilterOp::Lt,
                FilterOp::Lte,
                FilterOp::Between,
            ],
            Self::Enum(_) => &[FilterOp::Eq],
        }
    }

    #[must_use]
    pub fn supports(self, op: FilterOp) -> bool {
        self.operators().contains(&op)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("number"),
            Self::Date => f.write_str("date (YYYY-MM-DD)"),
            Self::Enum(values) => write!(f, "value of [{}]", values.join(", ")),
        }
    }
}

/// Comparison operator of the filter grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Between,
}

/// How many operands an operator accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    One,
    OneOrMore,
    Two,
}

impl Arity {
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::One => count == 1,
            Self::OneOrMore => count >= 1,
            Self::Two => count == 2,
        }
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::One => "exactly 1",
            Self::OneOrMore => "at least 1",
            Self::Two => "exactly 2",
        }
    }
}

impl FilterOp {
    pub const ALL: &'static [Self] = &[
        Self::Eq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::Between,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Between => "between",
        }
    }

    /// Parses the wire token of an operator. Tokens are lowercase and matched exactly.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == token)
    }

    #[must_use]
    pub fn arity(self) -> Arity {
        match self {
            Self::Eq => Arity::OneOrMore,
            Self::Between => Arity::Two,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Like => Arity::One,
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field that may appear in a filter expression of one endpoint.
///
/// Implemented by the enums declared with [`supported_filters!`](crate::supported_filters).
pub trait FilterField: Copy + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static {
    const FIELDS: &'static [Self];

    /// API name of the field as it appears in `field||op||value`.
    fn name(&self) -> &'static str;

    fn kind(&self) -> FieldKind;

    /// Operators permitted on this endpoint. Defaults to everything the kind supports.
    fn operators(&self) -> &'static [FilterOp] {
        self.kind().operators()
    }

    /// Case-insensitive lookup by API name.
    fn from_name(name: &str) -> Option<Self> {
        Self::FIELDS
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    fn allows(&self, op: FilterOp) -> bool {
        self.kind().supports(op) && self.operators().contains(&op)
    }
}

/// A typed operand value.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Enum(String),
}

impl FilterValue {
    /// Coerces a raw operand to the field's value type.
    ///
    /// Enum values are returned in their declared spelling.
    #[must_use]
    pub fn coerce(kind: FieldKind, raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match kind {
            FieldKind::String => Some(Self::String(raw.to_owned())),
            FieldKind::Integer => trimmed.parse().ok().map(Self::Integer),
            FieldKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Float),
            FieldKind::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .map(Self::Date),
            FieldKind::Enum(values) => values
                .iter()
                .find(|v| v.eq_ignore_ascii_case(trimmed))
                .map(|v| Self::Enum((*v).to_owned())),
        }
    }

    /// Whether this value can be compared against a column of the given kind.
    #[must_use]
    pub fn matches_kind(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Self::String(_), FieldKind::String)
            | (Self::Integer(_), FieldKind::Integer)
            | (Self::Float(_), FieldKind::Float)
            | (Self::Date(_), FieldKind::Date) => true,
            (Self::Enum(v), FieldKind::Enum(values)) => {
                values.iter().any(|allowed| *allowed == v.as_str())
            }
            _ => false,
        }
    }

    /// Ordering between two values of the same variant; `None` across variants.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) | (Self::Enum(a), Self::Enum(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) | Self::Enum(v) => f.write_str(v),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
        }
    }
}

/// Operator plus operand(s) of one condition.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterProperty {
    /// One value compiles to `=`, several to `IN (...)`.
    Eq(Vec<FilterValue>),
    Gt(FilterValue),
    Gte(FilterValue),
    Lt(FilterValue),
    Lte(FilterValue),
    /// A complete LIKE pattern, wildcards included, escaped with `\`.
    Like(String),
    Between(FilterValue, FilterValue),
}

impl FilterProperty {
    #[must_use]
    pub fn op(&self) -> FilterOp {
        match self {
            Self::Eq(_) => FilterOp::Eq,
            Self::Gt(_) => FilterOp::Gt,
            Self::Gte(_) => FilterOp::Gte,
            Self::Lt(_) => FilterOp::Lt,
            Self::Lte(_) => FilterOp::Lte,
            Self::Like(_) => FilterOp::Like,
            Self::Between(..) => FilterOp::Between,
        }
    }

    /// Whether every operand is of the given kind and the operand count is well-formed.
    #[must_use]
    pub fn matches_kind(&self, kind: FieldKind) -> bool {
        match self {
            Self::Eq(values) => !values.is_empty() && values.iter().all(|v| v.matches_kind(kind)),
            Self::Gt(v) | Self::Gte(v) | Self::Lt(v) | Self::Lte(v) => v.matches_kind(kind),
            Self::Like(_) => kind == FieldKind::String,
            Self::Between(lo, hi) => lo.matches_kind(kind) && hi.matches_kind(kind),
        }
    }
}

/// One typed comparison over a single allow-listed field.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter<F> {
    pub field: F,
    pub property: FilterProperty,
}

impl<F: FilterField> Filter<F> {
    pub fn new(field: F, property: FilterProperty) -> Self {
        Self { field, property }
    }

    #[must_use]
    pub fn op(&self) -> FilterOp {
        self.property.op()
    }

    /// Whether the field's allow-list entry admits this operator and operand type.
    #[must_use]
    pub fn is_permitted(&self) -> bool {
        self.field.allows(self.op()) && self.property.matches_kind(self.field.kind())
    }
}

/// Escapes `\`, `%` and `_` so the text matches literally inside a LIKE pattern.
#[must_use]
pub fn like_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Substring pattern: the escaped operand wrapped in `%` wildcards.
#[must_use]
pub fn like_contains(value: &str) -> String {
    format!("%{}%", like_escape(value))
}

/// Declares an allow-list enum implementing [`FilterField`].
///
/// ```
/// use catalog_query::{FieldKind, FilterField, FilterOp, supported_filters};
///
/// supported_filters! {
///     pub enum BookFilter {
///         Title => "title": FieldKind::String,
///         ReleaseYear => "releaseYear": FieldKind::Integer => [Lt, Gt, Between],
///     }
/// }
///
/// assert_eq!(BookFilter::from_name("releaseyear"), Some(BookFilter::ReleaseYear));
/// assert!(!BookFilter::ReleaseYear.allows(FilterOp::Eq));
/// ```
#[macro_export]
macro_rules! supported_filters {
    (@ops $kind:expr) => {
        $crate::FieldKind::operators($kind)
    };
    (@ops $kind:expr, [$($op:ident),+]) => {
        &[$($crate::FilterOp::$op),+]
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $variant:ident => $api:literal : $kind:expr $( => [ $($op:ident),+ $(,)? ] )?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::FilterField for $name {
            const FIELDS: &'static [Self] = &[$(Self::$variant),+];

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $api),+
                }
            }

            fn kind(&self) -> $crate::FieldKind {
                match self {
                    $(Self::$variant => $kind),+
                }
            }

            fn operators(&self) -> &'static [$crate::FilterOp] {
                match self {
                    $(Self::$variant => $crate::supported_filters!(@ops $kind $(, [$($op),+])?)),+
                }
            }
        }
    };
}
