//! Unit of work: one physical transaction shared by every repository call of a request.
//!
//! ```text
//! Created ──run_in_transaction──▶ Active ──Ok──▶ Committed
//!                                   │
//!                                   │       (Finishing while COMMIT is in flight)
//!                                   └──Err / rollback-only / dropped──▶ RolledBack
//! ```
//!
//! A unit dropped while its `COMMIT` is in flight stays `Finishing`: the outcome is unknown.
//!
//! Calling [`UnitOfWork::run_in_transaction`] again while the unit is `Active` (or going through
//! [`TxHandle::run_in_transaction`]) joins the open transaction; only the outermost call commits
//! or rolls back. Any call after `Committed`/`RolledBack` panics.

mod factory;
mod handle;

pub use factory::{AcquirePolicy, UnitOfWorkFactory};
pub use handle::TxHandle;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;
use sea_orm::error::ConnAcquireErr;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::DbError;
use crate::tx_config::TxConfig;

/// Boxed future returned by unit-of-work callbacks; borrows the transaction for `'a`.
pub type TxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Observable lifecycle state of a [`UnitOfWork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UowState {
    Created,
    Active,
    /// `COMMIT` issued, outcome not yet known.
    Finishing,
    Committed,
    RolledBack,
}

impl UowState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl fmt::Display for UowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Finishing => "finishing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
        })
    }
}

enum Slot {
    Created,
    Beginning,
    Active(Arc<DatabaseTransaction>),
    Finishing,
    Committed,
    RolledBack,
}

impl Slot {
    fn state(&self) -> UowState {
        match self {
            Self::Created => UowState::Created,
            Self::Beginning | Self::Active(_) => UowState::Active,
            Self::Finishing => UowState::Finishing,
            Self::Committed => UowState::Committed,
            Self::RolledBack => UowState::RolledBack,
        }
    }
}

enum Entry {
    Begin,
    Join(Arc<DatabaseTransaction>),
}

/// A single transactional scope. Created by [`UnitOfWorkFactory::create`].
pub struct UnitOfWork {
    id: Uuid,
    conn: DatabaseConnection,
    acquire: AcquirePolicy,
    config: TxConfig,
    slot: Mutex<Slot>,
    depth: AtomicU32,
    rollback_only: AtomicBool,
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UnitOfWork {
    pub(crate) fn new(conn: DatabaseConnection, acquire: AcquirePolicy, config: TxConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            conn,
            acquire,
            config,
            slot: Mutex::new(Slot::Created),
            depth: AtomicU32::new(0),
            rollback_only: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> UowState {
        self.slot.lock().state()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == UowState::Active
    }

    /// Runs `f` inside this unit's transaction.
    ///
    /// The outermost call begins the transaction, commits when `f` returns `Ok` and rolls back
    /// when it returns `Err` (or the unit was marked rollback-only), returning `f`'s error as is.
    /// A call made while the unit is already active joins the open transaction and leaves
    /// commit/rollback to the outermost call. Dropping the returned future before it completes
    /// rolls the transaction back and returns the connection to the pool.
    ///
    /// # Errors
    /// `f`'s own error, or a [`DbError`] converted into `E` when the transaction cannot be
    /// started ([`DbError::PoolExhausted`] after the configured acquire attempts) or committed
    /// ([`DbError::CommitFailed`]).
    ///
    /// # Panics
    /// Panics when the unit of work has already been committed or rolled back (or was dropped
    /// mid-commit), or when another task is starting its transaction at the same time.
    #[instrument(name = "unit_of_work", skip_all, fields(uow_id = %self.id))]
    pub async fn run_in_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(TxHandle<'a>) -> TxFuture<'a, T, E> + Send,
        T: Send,
        E: From<DbError> + Send,
    {
        match self.enter() {
            Entry::Join(txn) => {
                let _depth = self.nest();
                let depth = self.depth.load(Ordering::SeqCst);
                debug!(depth, "joining active transaction");
                f(TxHandle::new(self, &txn, depth)).await
            }
            Entry::Begin => self.begin_and_run(f).await,
        }
    }

    fn enter(&self) -> Entry {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Created => {
                *slot = Slot::Beginning;
                Entry::Begin
            }
            Slot::Active(txn) => Entry::Join(Arc::clone(txn)),
            Slot::Beginning => panic!(
                "unit of work {} is already starting its transaction on another task",
                self.id
            ),
            Slot::Finishing => panic!(
                "unit of work {} used while its commit outcome is unknown",
                self.id
            ),
            Slot::Committed | Slot::RolledBack => panic!(
                "unit of work {} used after it was {}",
                self.id,
                slot.state()
            ),
        }
    }

    async fn begin_and_run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(TxHandle<'a>) -> TxFuture<'a, T, E> + Send,
        T: Send,
        E: From<DbError> + Send,
    {
        let mut scope = ActiveScope {
            uow: self,
            armed: true,
        };

        let txn = match self.begin().await {
            Ok(txn) => Arc::new(txn),
            Err(e) => {
                scope.reset();
                return Err(E::from(e));
            }
        };
        *self.slot.lock() = Slot::Active(Arc::clone(&txn));
        debug!("began transaction");

        let result = {
            let _depth = self.nest();
            f(TxHandle::new(self, &txn, 1)).await
        };

        // Joined calls have finished by now; ours must be the last reference.
        let shared = std::mem::replace(&mut *self.slot.lock(), Slot::Finishing);
        drop(shared);
        let Ok(txn) = Arc::try_unwrap(txn) else {
            panic!(
                "unit of work {} finished while its transaction was still borrowed",
                self.id
            );
        };

        let rollback_only = self.rollback_only.load(Ordering::SeqCst);
        if let (Ok(_), false) = (&result, rollback_only) {
            let committed = txn.commit().await;
            scope.armed = false;
            return match committed {
                Ok(()) => {
                    *self.slot.lock() = Slot::Committed;
                    info!("transaction committed");
                    result
                }
                Err(e) => {
                    // A failed COMMIT is not retried; the transaction is dropped and rolled back.
                    *self.slot.lock() = Slot::RolledBack;
                    warn!(error = %e, "transaction commit failed");
                    Err(E::from(DbError::CommitFailed(e)))
                }
            };
        }

        // Dropping the transaction rolls it back even if the explicit rollback below is cut short.
        scope.armed = false;
        *self.slot.lock() = Slot::RolledBack;
        match result {
            Ok(value) => {
                rollback(txn).await;
                info!("transaction rolled back on request");
                Ok(value)
            }
            Err(err) => {
                rollback(txn).await;
                info!("transaction rolled back");
                Err(err)
            }
        }
    }

    /// Begins the physical transaction, retrying pool acquire timeouts with backoff.
    async fn begin(&self) -> Result<DatabaseTransaction, DbError> {
        let mut backoff = self.acquire.backoff();
        let mut attempt = 1;
        loop {
            let started = self
                .conn
                .begin_with_config(self.config.sea_isolation(), self.config.sea_access_mode())
                .await;
            match started {
                Ok(txn) => return Ok(txn),
                Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout))
                    if attempt < self.acquire.attempts() =>
                {
                    warn!(
                        attempt,
                        max_attempts = self.acquire.attempts(),
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "connection pool exhausted, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) => {
                    warn!(attempts = attempt, "connection pool exhausted");
                    return Err(DbError::PoolExhausted { attempts: attempt });
                }
                Err(e) => return Err(DbError::Sea(e)),
            }
        }
    }

    pub(crate) fn mark_rollback_only(&self) {
        self.rollback_only.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_rollback_only(&self) -> bool {
        self.rollback_only.load(Ordering::SeqCst)
    }

    pub(crate) fn nest(&self) -> DepthGuard<'_> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        DepthGuard(&self.depth)
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!(error = %e, "transaction rollback failed");
    }
}

pub(crate) struct DepthGuard<'a>(&'a AtomicU32);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Rolls back and terminates the unit if the outermost call is dropped mid-flight.
struct ActiveScope<'u> {
    uow: &'u UnitOfWork,
    armed: bool,
}

impl ActiveScope<'_> {
    /// Begin failed before anything ran: the unit may be retried.
    fn reset(&mut self) {
        self.armed = false;
        *self.uow.slot.lock() = Slot::Created;
    }
}

impl Drop for ActiveScope<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slot = self.uow.slot.lock();
        if matches!(*slot, Slot::Finishing) {
            warn!(
                uow_id = %self.uow.id,
                "unit of work dropped while committing; outcome unknown"
            );
            return;
        }
        let previous = std::mem::replace(&mut *slot, Slot::RolledBack);
        drop(slot);
        if matches!(previous, Slot::Active(_)) {
            warn!(
                uow_id = %self.uow.id,
                "unit of work dropped before completion; rolling back"
            );
        }
        // Dropping the last transaction reference issues the rollback and releases the connection.
        drop(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectOpts, DbHandle};
    use sea_orm::{ConnectionTrait, Statement};
    use tracing_test::traced_test;

    async fn setup() -> (DbHandle, UnitOfWorkFactory) {
        let db = DbHandle::connect(
            "sqlite::memory:",
            ConnectOpts {
                max_conns: Some(1),
                ..ConnectOpts::default()
            },
        )
        .await
        .unwrap();
        db.sea()
            .execute_unprepared("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)")
            .await
            .unwrap();
        let factory = UnitOfWorkFactory::new(&db);
        (db, factory)
    }

    async fn insert(tx: TxHandle<'_>, body: &str) -> Result<(), DbError> {
        tx.conn()
            .execute(Statement::from_sql_and_values(
                tx.conn().get_database_backend(),
                "INSERT INTO notes (body) VALUES (?)",
                [body.into()],
            ))
            .await?;
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn nested_calls_share_one_physical_transaction() {
        let (_db, factory) = setup().await;
        let uow = Arc::new(factory.create());
        let inner = Arc::clone(&uow);

        uow.run_in_transaction::<_, DbError, _>(move |tx| {
            Box::pin(async move {
                insert(tx, "outer").await?;
                assert_eq!(tx.depth(), 1);

                inner
                    .run_in_transaction::<_, DbError, _>(|tx| {
                        Box::pin(async move {
                            assert_eq!(tx.depth(), 2);
                            insert(tx, "inner").await
                        })
                    })
                    .await?;
                assert_eq!(inner.state(), UowState::Active);

                tx.run_in_transaction(|nested| async move {
                    assert!(nested.is_nested());
                    insert(nested, "via handle").await
                })
                .await
            })
        })
        .await
        .unwrap();

        assert_eq!(uow.state(), UowState::Committed);
        logs_assert(|lines: &[&str]| {
            let began = lines.iter().filter(|l| l.contains("began transaction")).count();
            let committed = lines
                .iter()
                .filter(|l| l.contains("transaction committed"))
                .count();
            let joined = lines
                .iter()
                .filter(|l| l.contains("joining active transaction"))
                .count();
            match (began, committed, joined) {
                (1, 1, 2) => Ok(()),
                other => Err(format!("unexpected (began, committed, joined): {other:?}")),
            }
        });
    }

    #[tokio::test]
    #[should_panic(expected = "used after it was committed")]
    async fn reuse_after_commit_panics() {
        let (_db, factory) = setup().await;
        let uow = factory.create();
        uow.run_in_transaction::<_, DbError, _>(|_| Box::pin(async { Ok(()) }))
            .await
            .unwrap();
        let _ = uow
            .run_in_transaction::<_, DbError, _>(|_| Box::pin(async { Ok(()) }))
            .await;
    }

    #[tokio::test]
    async fn rollback_only_discards_writes_but_returns_value() {
        let (db, factory) = setup().await;
        let uow = factory.create();
        let value = uow
            .run_in_transaction::<_, DbError, _>(|tx| {
                Box::pin(async move {
                    insert(tx, "dry run").await?;
                    tx.set_rollback_only();
                    Ok(42)
                })
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(uow.state(), UowState::RolledBack);
        let row = db
            .sea()
            .query_one(Statement::from_string(
                db.sea().get_database_backend(),
                "SELECT COUNT(*) AS n FROM notes",
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<i64>("", "n").unwrap(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn dropped_mid_commit_stays_finishing() {
        let (_db, factory) = setup().await;
        let uow = factory.create();
        *uow.slot.lock() = Slot::Finishing;
        drop(ActiveScope {
            uow: &uow,
            armed: true,
        });

        assert_eq!(uow.state(), UowState::Finishing);
        assert!(!uow.state().is_terminal());
        assert!(logs_contain("outcome unknown"));
    }

    #[tokio::test]
    #[should_panic(expected = "commit outcome is unknown")]
    async fn unit_with_unknown_commit_outcome_cannot_be_reused() {
        let (_db, factory) = setup().await;
        let uow = factory.create();
        *uow.slot.lock() = Slot::Finishing;
        let _ = uow
            .run_in_transaction::<_, DbError, _>(|_| Box::pin(async { Ok(()) }))
            .await;
    }
}
