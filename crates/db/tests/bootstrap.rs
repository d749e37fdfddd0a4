use tdm_db::DbPool;

async fn pool() -> DbPool {
    tdm_db::create_in_memory_pool().await.unwrap()
}

/// Full bootstrap: connect, migrate, verify schema.
#[tokio::test]
async fn test_full_bootstrap() {
    let pool = pool().await;
    tdm_db::health_check(&pool).await.unwrap();

    let tables = [
        "destinations",
        "destination_images",
        "pending_file_cleanups",
        "users",
    ];
    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Foreign keys are enforced on every connection.
#[tokio::test]
async fn test_foreign_keys_enabled() {
    let pool = pool().await;
    let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(enabled, 1);
}

/// Migrations are idempotent.
#[tokio::test]
async fn test_migrations_rerun() {
    let pool = pool().await;
    tdm_db::run_migrations(&pool).await.unwrap();
}
