//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `gatherly_test`)
//!   `TEST_DB_PASSWORD` (default: `gatherly_test`)
//!   `TEST_DB_NAME` (default: `gatherly_test`)

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use gatherly_db::entities::{archived_user, pending_deletion, user};
use gatherly_db::repositories::{DeletionRepository, PendingDeletionRepository, UserRepository};
use gatherly_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn database_connection_works() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn cleanup_truncates_tables() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

async fn insert_user(conn: &sea_orm::DatabaseConnection, id: &str) -> user::Model {
    user::ActiveModel {
        id: Set(id.to_string()),
        email: Set(format!("{id}@example.com")),
        email_lower: Set(format!("{id}@example.com")),
        first_name: Set("Ada".to_string()),
        last_name: Set("Lovelace".to_string()),
        password: Set("hash".to_string()),
        token: Set(None),
        is_blocked: Set(false),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn schedule_blocks_the_user_and_enforces_uniqueness() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    gatherly_db::migrate(test_db.connection()).await.unwrap();

    let conn = test_db.conn.clone();
    let users = UserRepository::new(conn.clone());
    let pending = PendingDeletionRepository::new(conn);

    insert_user(test_db.connection(), "user1").await;

    let due = Utc::now() + Duration::days(28);
    pending
        .schedule("pd1".to_string(), "user1", due, Utc::now())
        .await
        .unwrap();

    let user = users.get_by_id("user1").await.unwrap();
    assert!(user.is_blocked);

    // Second attempt hits the unique index
    let second = pending
        .schedule("pd2".to_string(), "user1", due, Utc::now())
        .await;
    assert!(matches!(
        second,
        Err(gatherly_common::AppError::AlreadyScheduled(_))
    ));

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn delete_completely_removes_user_and_ledger_row() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    gatherly_db::migrate(test_db.connection()).await.unwrap();

    let conn = test_db.conn.clone();
    let users = UserRepository::new(conn.clone());
    let pending = PendingDeletionRepository::new(conn.clone());
    let deletion = DeletionRepository::new(conn);

    insert_user(test_db.connection(), "user1").await;
    pending
        .schedule("pd1".to_string(), "user1", Utc::now(), Utc::now())
        .await
        .unwrap();

    let archive = deletion
        .delete_completely("user1", Utc::now(), "arch1".to_string())
        .await
        .unwrap();
    assert_eq!(archive.first_name, "Ada");

    assert!(users.find_by_id("user1").await.unwrap().is_none());
    let leftover = pending_deletion::Entity::find()
        .all(test_db.connection())
        .await
        .unwrap();
    assert!(leftover.is_empty());

    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn failed_deletion_batch_leaves_everything_in_place() {
    let test_db = TestDatabase::create_unique().await.unwrap();
    gatherly_db::migrate(test_db.connection()).await.unwrap();

    let conn = test_db.conn.clone();
    let users = UserRepository::new(conn.clone());
    let pending = PendingDeletionRepository::new(conn.clone());
    let deletion = DeletionRepository::new(conn);

    insert_user(test_db.connection(), "user1").await;
    pending
        .schedule("pd1".to_string(), "user1", Utc::now(), Utc::now())
        .await
        .unwrap();

    // Occupy the archive id so the mid-batch insert hits the primary key
    archived_user::ActiveModel {
        id: Set("arch1".to_string()),
        first_name: Set("Existing".to_string()),
        last_name: Set("Archive".to_string()),
        registered_at: Set(Utc::now().into()),
        deleted_at: Set(Utc::now().into()),
        events_participated: Set(serde_json::json!([])),
    }
    .insert(test_db.connection())
    .await
    .unwrap();

    let result = deletion
        .delete_completely("user1", Utc::now(), "arch1".to_string())
        .await;
    assert!(result.is_err());

    // The whole batch rolled back: user, ledger row, and archive table
    // look exactly as before the attempt
    let user = users.get_by_id("user1").await.unwrap();
    assert!(user.is_blocked);

    let ledger = pending_deletion::Entity::find()
        .all(test_db.connection())
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);

    let archives = archived_user::Entity::find()
        .all(test_db.connection())
        .await
        .unwrap();
    assert_eq!(archives.len(), 1);
    assert_eq!(archives[0].first_name, "Existing");

    test_db.drop_database().await.unwrap();
}
