//! Filter and pagination layer shared by every catalog endpoint.
//!
//! Raw query input (`filter=[...]&page=..&limit=..`) is validated here against a statically
//! declared allow-list and turned into plain data: [`Filter`] values and [`PaginationData`].
//! Nothing in this crate touches the database; compilation to SQL lives in `catalog-db`.

pub mod errors;
pub mod filter;
pub mod limits;
pub mod page;
pub mod pagination;
pub mod parser;
pub mod problem;
pub mod request;

pub use errors::QueryError;
pub use filter::{FieldKind, Filter, FilterField, FilterOp, FilterProperty, FilterValue};
pub use limits::QueryLimits;
pub use page::Page;
pub use pagination::{PaginationData, QueryParams, parse_pagination};
pub use parser::{parse_filter_entries, parse_filters};
pub use problem::{APPLICATION_PROBLEM_JSON, Problem};
pub use request::{ListQuery, ListRequest};
