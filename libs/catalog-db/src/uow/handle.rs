use std::fmt;
use std::future::Future;

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use tracing::debug;
use uuid::Uuid;

use super::UnitOfWork;

/// Data-access handle of an active [`UnitOfWork`].
///
/// Every repository and service method takes the handle as an explicit argument. It cannot
/// outlive the `run_in_transaction` call that produced it.
#[derive(Clone, Copy)]
pub struct TxHandle<'a> {
    uow: &'a UnitOfWork,
    txn: &'a DatabaseTransaction,
    depth: u32,
}

impl fmt::Debug for TxHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxHandle")
            .field("uow_id", &self.uow.id())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<'a> TxHandle<'a> {
    pub(crate) fn new(uow: &'a UnitOfWork, txn: &'a DatabaseTransaction, depth: u32) -> Self {
        Self { uow, txn, depth }
    }

    /// Connection to issue statements on; they run inside the unit's transaction, in order.
    #[must_use]
    pub fn conn(&self) -> &'a (impl ConnectionTrait + Send + Sync + use<'a>) {
        self.txn
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.uow.id()
    }

    /// 1 for the outermost call, incremented for every joined call.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.depth > 1
    }

    #[must_use]
    pub fn unit_of_work(&self) -> &'a UnitOfWork {
        self.uow
    }

    /// Makes the outermost call roll back instead of committing, even if it succeeds.
    pub fn set_rollback_only(&self) {
        self.uow.mark_rollback_only();
    }

    #[must_use]
    pub fn is_rollback_only(&self) -> bool {
        self.uow.is_rollback_only()
    }

    /// Runs `f` inside the already open transaction. Commit and rollback stay with the outermost
    /// [`UnitOfWork::run_in_transaction`] call; an `Err` from `f` is returned unchanged.
    ///
    /// # Errors
    /// Whatever `f` returns.
    pub async fn run_in_transaction<T, E, F, Fut>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(TxHandle<'a>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _depth = self.uow.nest();
        let nested = Self {
            depth: self.depth + 1,
            ..*self
        };
        debug!(depth = nested.depth, "joining active transaction");
        f(nested).await
    }
}
