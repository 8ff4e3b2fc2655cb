use super::*;
use sqlx::sqlite::SqlitePoolOptions;

pub(crate) async fn memory_pool() -> SqlitePool {
    // A single connection, because "sqlite::memory:" hands out a fresh
    // throwaway database per connection otherwise.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool");
    init(&pool).await.expect("schema init");
    pool
}

#[tokio::test]
async fn init_is_idempotent() {
    let pool = memory_pool().await;
    init(&pool).await.expect("second init should not fail");
}

#[tokio::test]
async fn tables_exist_after_init() {
    let pool = memory_pool().await;
    let names: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&pool)
            .await
            .expect("list tables");
    let names: Vec<String> = names.into_iter().map(|(n,)| n).collect();
    assert!(names.contains(&"plans".to_string()));
    assert!(names.contains(&"actions".to_string()));
    assert!(names.contains(&"triggers".to_string()));
}
