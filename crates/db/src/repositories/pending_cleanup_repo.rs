//! Repository for the `pending_file_cleanups` table.

use chrono::Utc;
use sqlx::SqlitePool;
use tdm_core::types::DbId;

use crate::models::pending_cleanup::PendingFileCleanup;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, backend, path, attempts, last_error, created_at, updated_at";

/// Tracks files that still need deleting.
pub struct PendingCleanupRepo;

impl PendingCleanupRepo {
    /// Record a failed deletion. Re-recording the same file bumps `attempts`.
    pub async fn record(
        pool: &SqlitePool,
        backend: &str,
        path: &str,
        error: &str,
    ) -> Result<PendingFileCleanup, sqlx::Error> {
        let query = format!(
            "INSERT INTO pending_file_cleanups
                (backend, path, attempts, last_error, created_at, updated_at)
             VALUES ($1, $2, 1, $3, $4, $4)
             ON CONFLICT (backend, path) DO UPDATE SET
                attempts = pending_file_cleanups.attempts + 1,
                last_error = excluded.last_error,
                updated_at = excluded.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingFileCleanup>(&query)
            .bind(backend)
            .bind(path)
            .bind(error)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// All pending entries, oldest first.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<PendingFileCleanup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_file_cleanups ORDER BY id");
        sqlx::query_as::<_, PendingFileCleanup>(&query)
            .fetch_all(pool)
            .await
    }

    /// Bump the attempt count after another failed retry.
    pub async fn record_failure(
        pool: &SqlitePool,
        id: DbId,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pending_file_cleanups
             SET attempts = attempts + 1, last_error = $2, updated_at = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop an entry once its file is gone.
    pub async fn resolve(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pending_file_cleanups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_file_cleanups")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
