//! Typed filters and pagination compiled into `SeaORM` selects.
//!
//! Each entity declares which column every allow-listed field maps to by implementing
//! [`QueryEntity`]; [`QueryBuilder`] then turns `&[Filter<F>]` plus [`PaginationData`] into a
//! single parameterized `SELECT`. Conditions are conjunctive: the first follows `WHERE`, every
//! further one follows `AND`.

pub mod compile;

use std::marker::PhantomData;

use catalog_query::{Filter, FilterField, Page, PaginationData};
use sea_orm::sea_query::{ColumnRef, IntoColumnRef};
use sea_orm::{
    DbBackend, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, RelationDef, Select, Statement, sea_query::IntoCondition,
};
use tracing::debug;

use crate::uow::TxHandle;
use crate::{DbError, Result};

/// An entity that can be listed with filters of allow-list `F`.
pub trait QueryEntity<F: FilterField>: EntityTrait {
    /// Table-qualified column a filter field compiles against.
    ///
    /// Fields of relationship-scoped endpoints may map to columns of a joined table.
    fn filter_column(field: F) -> ColumnRef;

    /// Column defining insertion order; list results are sorted by it ascending.
    fn insertion_order() -> Self::Column;
}

/// Table-qualified reference to a column of `E`.
#[must_use]
pub fn column_of<E: EntityTrait>(column: E::Column) -> ColumnRef {
    (E::default(), column).into_column_ref()
}

/// Value-returning query builder for entity `E` filtered by allow-list `F`.
///
/// Every method consumes the builder and returns the extended one, so a builder shared through
/// `clone()` is never changed behind its owner's back.
#[derive(Debug, Clone)]
#[must_use]
pub struct QueryBuilder<E: EntityTrait, F> {
    select: Select<E>,
    conditions: usize,
    offset: Option<u64>,
    limit: Option<u64>,
    _fields: PhantomData<fn() -> F>,
}

impl<E, F> Default for QueryBuilder<E, F>
where
    E: QueryEntity<F>,
    E::Model: Sync,
    F: FilterField,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, F> QueryBuilder<E, F>
where
    E: QueryEntity<F>,
    E::Model: Sync,
    F: FilterField,
{
    /// All rows of `E`.
    pub fn new() -> Self {
        Self::scoped(E::find())
    }

    /// Starts from a prepared select, typically one already joined to a related table.
    pub fn scoped(select: Select<E>) -> Self {
        Self {
            select,
            conditions: 0,
            offset: None,
            limit: None,
            _fields: PhantomData,
        }
    }

    /// Joins a related table so filter columns may reference it.
    pub fn join(self, relation: RelationDef) -> Self {
        Self {
            select: self.select.join(JoinType::InnerJoin, relation),
            ..self
        }
    }

    /// Restricts rows independently of user filters, e.g. to one parent entity.
    pub fn scope(self, condition: impl IntoCondition) -> Self {
        Self {
            select: self.select.filter(condition),
            ..self
        }
    }

    /// Appends one condition per filter, in order.
    ///
    /// # Panics
    /// Panics if a filter is not admitted by its field's allow-list entry; see
    /// [`compile::filter_expr`].
    pub fn conditions(self, filters: &[Filter<F>]) -> Self {
        filters.iter().fold(self, Self::condition)
    }

    /// # Panics
    /// Panics if the filter is not admitted by its field's allow-list entry.
    pub fn condition(self, filter: &Filter<F>) -> Self {
        let expr = compile::filter_expr(E::filter_column(filter.field), filter);
        Self {
            select: self.select.filter(expr),
            conditions: self.conditions + 1,
            ..self
        }
    }

    pub fn skip(self, offset: u64) -> Self {
        Self {
            offset: Some(offset),
            ..self
        }
    }

    pub fn take(self, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    /// `skip((page - 1) * limit)` and `take(limit)`.
    pub fn paginate(self, pagination: &PaginationData) -> Self {
        self.skip(pagination.offset()).take(pagination.limit())
    }

    /// Number of filter conditions applied so far.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.conditions
    }

    /// The full select: conditions, insertion order, offset and limit.
    #[must_use]
    pub fn into_select(self) -> Select<E> {
        let mut select = self.select.order_by_asc(E::insertion_order());
        if let Some(offset) = self.offset {
            select = select.offset(offset);
        }
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }
        select
    }

    /// SQL and bound values for `backend`, without executing anything.
    #[must_use]
    pub fn statement(&self, backend: DbBackend) -> Statement {
        self.clone().into_select().build(backend)
    }

    /// SQL text with parameter placeholders; operand values never appear in it.
    #[must_use]
    pub fn sql(&self, backend: DbBackend) -> String {
        self.statement(backend).sql
    }

    /// Executes the query inside the unit of work.
    ///
    /// # Errors
    /// Returns [`DbError::Sea`] when the query fails.
    pub async fn get_many(&self, tx: &TxHandle<'_>) -> Result<Vec<E::Model>> {
        let select = self.clone().into_select();
        debug!(
            conditions = self.conditions,
            offset = self.offset,
            limit = self.limit,
            "running list query"
        );
        select.all(tx.conn()).await.map_err(DbError::from)
    }

    /// Rows matching the conditions, ignoring skip/take.
    ///
    /// # Errors
    /// Returns [`DbError::Sea`] when the query fails.
    pub async fn count(&self, tx: &TxHandle<'_>) -> Result<u64> {
        self.select
            .clone()
            .count(tx.conn())
            .await
            .map_err(DbError::from)
    }

    /// One page of rows plus the total count of matching rows.
    ///
    /// # Errors
    /// Returns [`DbError::Sea`] when either query fails.
    pub async fn get_page(
        &self,
        tx: &TxHandle<'_>,
        pagination: &PaginationData,
    ) -> Result<Page<E::Model>> {
        let total = self.count(tx).await?;
        let items = self.clone().paginate(pagination).get_many(tx).await?;
        Ok(Page::new(items, pagination, total))
    }
}
