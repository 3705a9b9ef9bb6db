#![allow(dead_code)]

use std::time::Duration;

use catalog_db::{ConnectOpts, DbError, DbHandle, TxHandle};
use sea_orm::{ConnectionTrait, Statement};
use tempfile::TempDir;

pub const NOTES_DDL: &str =
    "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)";

/// File-backed database so several pooled connections see the same data.
pub async fn file_db(opts: ConnectOpts) -> (TempDir, DbHandle) {
    let dir = tempfile::tempdir().expect("tempdir");
    let dsn = format!("sqlite://{}", dir.path().join("catalog.db").display());
    let db = DbHandle::connect(&dsn, opts).await.expect("connect");
    db.sea()
        .execute_unprepared(NOTES_DDL)
        .await
        .expect("create notes");
    (dir, db)
}

pub fn opts(max_conns: u32, acquire_timeout: Duration, attempts: u32) -> ConnectOpts {
    ConnectOpts {
        max_conns: Some(max_conns),
        acquire_timeout: Some(acquire_timeout),
        acquire_attempts: attempts,
        acquire_backoff: Duration::from_millis(10),
        ..ConnectOpts::default()
    }
}

pub async fn insert_note(tx: TxHandle<'_>, body: &str) -> Result<(), DbError> {
    tx.conn()
        .execute(Statement::from_sql_and_values(
            tx.conn().get_database_backend(),
            "INSERT INTO notes (body) VALUES (?)",
            [body.into()],
        ))
        .await?;
    Ok(())
}

pub async fn count_notes(tx: TxHandle<'_>) -> Result<i64, DbError> {
    let row = tx
        .conn()
        .query_one(Statement::from_string(
            tx.conn().get_database_backend(),
            "SELECT COUNT(*) AS n FROM notes",
        ))
        .await?
        .ok_or_else(|| DbError::InvalidConfig("COUNT returned no row".to_owned()))?;
    Ok(row.try_get::<i64>("", "n")?)
}
