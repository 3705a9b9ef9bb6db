#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_db::{DbError, UnitOfWorkFactory, UowState};
use common::{count_notes, file_db, insert_note, opts};
use sea_orm::ConnectionTrait;
use tracing_test::traced_test;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("customer {0} is blocked")]
    Blocked(u32),
    #[error(transparent)]
    Db(#[from] DbError),
}

async fn notes_in_fresh_unit(factory: &UnitOfWorkFactory) -> i64 {
    factory
        .run::<_, DbError, _>(|tx| Box::pin(async move { count_notes(tx).await }))
        .await
        .unwrap()
}

#[tokio::test]
async fn committed_write_is_visible_to_a_fresh_unit_of_work() {
    let (_dir, db) = file_db(opts(2, Duration::from_secs(2), 1)).await;
    let factory = UnitOfWorkFactory::new(&db);

    let uow = factory.create();
    assert_eq!(uow.state(), UowState::Created);
    uow.run_in_transaction::<_, DbError, _>(|tx| {
        Box::pin(async move { insert_note(tx, "kept").await })
    })
    .await
    .unwrap();

    assert_eq!(uow.state(), UowState::Committed);
    assert_eq!(notes_in_fresh_unit(&factory).await, 1);
}

#[tokio::test]
async fn failing_callback_rolls_back_and_returns_its_own_error() {
    let (_dir, db) = file_db(opts(2, Duration::from_secs(2), 1)).await;
    let factory = UnitOfWorkFactory::new(&db);

    let uow = factory.create();
    let err = uow
        .run_in_transaction::<(), AppError, _>(|tx| {
            Box::pin(async move {
                insert_note(tx, "discarded").await?;
                Err(AppError::Blocked(7))
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Blocked(7)));
    assert_eq!(uow.state(), UowState::RolledBack);
    assert_eq!(notes_in_fresh_unit(&factory).await, 0);
}

#[tokio::test]
async fn uncommitted_write_is_invisible_to_other_units() {
    let (_dir, db) = file_db(opts(2, Duration::from_secs(2), 1)).await;
    let factory = UnitOfWorkFactory::new(&db);
    let observer = factory.clone();

    factory
        .run::<_, DbError, _>(move |tx| {
            Box::pin(async move {
                insert_note(tx, "pending").await?;
                assert_eq!(count_notes(tx).await?, 1);
                assert_eq!(notes_in_fresh_unit(&observer).await, 0);
                Ok(())
            })
        })
        .await
        .unwrap();

    assert_eq!(notes_in_fresh_unit(&factory).await, 1);
}

#[tokio::test]
async fn pool_exhaustion_is_a_bounded_error() {
    let (_dir, db) = file_db(opts(1, Duration::from_millis(100), 2)).await;
    let factory = UnitOfWorkFactory::new(&db);
    let contender = factory.clone();

    factory
        .run::<_, DbError, _>(move |_tx| {
            Box::pin(async move {
                let started = Instant::now();
                let starved = contender.create();
                let err = starved
                    .run_in_transaction::<(), DbError, _>(|_| Box::pin(async { Ok(()) }))
                    .await
                    .unwrap_err();
                assert!(matches!(err, DbError::PoolExhausted { attempts: 2 }), "{err}");
                assert!(started.elapsed() < Duration::from_secs(5));
                // Begin failure leaves the unit unused.
                assert_eq!(starved.state(), UowState::Created);
                Ok(())
            })
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_unit_of_work_rolls_back_and_releases_its_connection() {
    let (_dir, db) = file_db(opts(1, Duration::from_secs(2), 1)).await;
    let factory = UnitOfWorkFactory::new(&db);
    let uow = Arc::new(factory.create());
    let (started_tx, started_rx) = tokio::sync::oneshot::channel();

    let task_uow = Arc::clone(&uow);
    let task = tokio::spawn(async move {
        task_uow
            .run_in_transaction::<(), DbError, _>(move |tx| {
                Box::pin(async move {
                    insert_note(tx, "abandoned").await?;
                    let _ = started_tx.send(());
                    std::future::pending::<()>().await;
                    Ok(())
                })
            })
            .await
    });

    started_rx.await.unwrap();
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(uow.state(), UowState::RolledBack);
    // With a single pooled connection this only succeeds if the aborted unit gave it back.
    assert_eq!(notes_in_fresh_unit(&factory).await, 0);
}

#[tokio::test]
#[should_panic(expected = "used after it was rolled back")]
async fn reuse_after_rollback_panics() {
    let (_dir, db) = file_db(opts(1, Duration::from_secs(2), 1)).await;
    let uow = UnitOfWorkFactory::new(&db).create();

    let _ = uow
        .run_in_transaction::<(), AppError, _>(|_| Box::pin(async { Err(AppError::Blocked(1)) }))
        .await;
    let _ = uow
        .run_in_transaction::<(), AppError, _>(|_| Box::pin(async { Ok(()) }))
        .await;
}

#[tokio::test]
async fn joined_failure_rolls_back_the_whole_unit() {
    let (_dir, db) = file_db(opts(1, Duration::from_secs(2), 1)).await;
    let factory = UnitOfWorkFactory::new(&db);

    let err = factory
        .run::<(), AppError, _>(|tx| {
            Box::pin(async move {
                insert_note(tx, "outer").await?;
                tx.run_in_transaction(|inner| async move {
                    insert_note(inner, "inner").await?;
                    Err(AppError::Blocked(3))
                })
                .await
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Blocked(3)));
    assert_eq!(notes_in_fresh_unit(&factory).await, 0);
}

#[tokio::test]
#[traced_test]
async fn failed_commit_surfaces_once_and_leaves_nothing_behind() {
    let (_dir, db) = file_db(opts(2, Duration::from_secs(2), 1)).await;
    for ddl in [
        "CREATE TABLE shelves (id INTEGER PRIMARY KEY)",
        "CREATE TABLE labels (
            id INTEGER PRIMARY KEY,
            shelf_id INTEGER NOT NULL REFERENCES shelves(id) DEFERRABLE INITIALLY DEFERRED
        )",
    ] {
        db.sea().execute_unprepared(ddl).await.unwrap();
    }
    let factory = UnitOfWorkFactory::new(&db);

    let uow = factory.create();
    let err = uow
        .run_in_transaction::<(), DbError, _>(|tx| {
            Box::pin(async move {
                insert_note(tx, "doomed").await?;
                // Deferred: accepted now, rejected by COMMIT.
                tx.conn()
                    .execute_unprepared("INSERT INTO labels (shelf_id) VALUES (99)")
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::CommitFailed(_)), "{err}");
    assert_eq!(uow.state(), UowState::RolledBack);
    assert_eq!(notes_in_fresh_unit(&factory).await, 0);
    logs_assert(|lines: &[&str]| {
        let failures = lines
            .iter()
            .filter(|l| l.contains("transaction commit failed"))
            .count();
        if failures == 1 {
            Ok(())
        } else {
            Err(format!("expected one commit attempt, saw {failures}"))
        }
    });
}

