#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use catalog_db::{ConnectOpts, DatabaseConfig, DbEngine, DbError, DbHandle};
use sea_orm::ConnectionTrait;

#[tokio::test]
async fn connects_from_loaded_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catalog.db");
    let cfg = DatabaseConfig {
        dsn: format!("sqlite://{}", path.display()),
        max_conns: Some(2),
        acquire_timeout: Some(Duration::from_secs(1)),
        ..DatabaseConfig::default()
    };

    let db = DbHandle::from_config(&cfg).await.unwrap();
    assert_eq!(db.engine(), DbEngine::Sqlite);
    assert_eq!(db.dsn(), cfg.dsn);
    db.sea().execute_unprepared("SELECT 1").await.unwrap();
    assert!(path.exists(), "parent directories are created on demand");

    db.close().await;
}

#[tokio::test]
async fn invalid_config_is_rejected_before_connecting() {
    let cfg = DatabaseConfig {
        dsn: "sqlite::memory:".to_owned(),
        acquire_attempts: 0,
        ..DatabaseConfig::default()
    };
    let err = DbHandle::from_config(&cfg).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidConfig(_)));
}

#[cfg(not(feature = "pg"))]
#[tokio::test]
async fn engine_without_its_feature_is_reported() {
    let err = DbHandle::connect("postgres://localhost/catalog", ConnectOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::FeatureDisabled(_)));
}
