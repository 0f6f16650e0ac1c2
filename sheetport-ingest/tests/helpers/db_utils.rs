//! Database Test Utilities

use sheetport_ingest::db::{init_database_pool, EntityStore, SqliteEntityStore};
use sheetport_ingest::models::{Entity, NewCustomer};
use tempfile::TempDir;

/// Store over a fresh on-disk database
///
/// Returns (TempDir, store) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> (TempDir, SqliteEntityStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_sheetport.db");
    let pool = init_database_pool(&db_path).await.unwrap();
    (temp_dir, SqliteEntityStore::new(pool))
}

/// Insert a customer directly, bypassing the pipeline
pub async fn seed_customer(store: &SqliteEntityStore, username: &str) {
    store
        .create(Entity::Customer(NewCustomer {
            username: username.to_string(),
            full_name: "Existing Customer".to_string(),
            email: format!("{}@example.com", username),
            ..Default::default()
        }))
        .await
        .unwrap();
}
