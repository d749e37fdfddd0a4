//! Repository for the `destination_images` table.

use chrono::Utc;
use sqlx::SqlitePool;
use tdm_core::types::DbId;

use crate::models::image::{
    CreateDestinationImage, DestinationImage, ImageWithDestination, UpdateDestinationImage,
};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, destination_id, image_path, thumbnail_path, caption, \
                                  is_optimized, created_at, updated_at";

/// Provides CRUD operations for destination images.
pub struct DestinationImageRepo;

impl DestinationImageRepo {
    /// Insert a new image row, returning the created row.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateDestinationImage,
    ) -> Result<DestinationImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO destination_images
                (destination_id, image_path, caption, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DestinationImage>(&query)
            .bind(input.destination_id)
            .bind(&input.image_path)
            .bind(&input.caption)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// Find an image by its internal ID.
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<DestinationImage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM destination_images WHERE id = $1");
        sqlx::query_as::<_, DestinationImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an image only if it belongs to `destination_id`.
    pub async fn find_for_destination(
        pool: &SqlitePool,
        destination_id: DbId,
        id: DbId,
    ) -> Result<Option<DestinationImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM destination_images WHERE id = $1 AND destination_id = $2"
        );
        sqlx::query_as::<_, DestinationImage>(&query)
            .bind(id)
            .bind(destination_id)
            .fetch_optional(pool)
            .await
    }

    /// List images of one destination, oldest first.
    pub async fn list_by_destination(
        pool: &SqlitePool,
        destination_id: DbId,
    ) -> Result<Vec<DestinationImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM destination_images
             WHERE destination_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, DestinationImage>(&query)
            .bind(destination_id)
            .fetch_all(pool)
            .await
    }

    /// List images of several destinations at once, ordered by destination then age.
    pub async fn list_by_destinations(
        pool: &SqlitePool,
        destination_ids: &[DbId],
    ) -> Result<Vec<DestinationImage>, sqlx::Error> {
        if destination_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=destination_ids.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {COLUMNS} FROM destination_images
             WHERE destination_id IN ({placeholders})
             ORDER BY destination_id, created_at, id"
        );
        let mut q = sqlx::query_as::<_, DestinationImage>(&query);
        for id in destination_ids {
            q = q.bind(*id);
        }
        q.fetch_all(pool).await
    }

    /// Every image, ordered by ID. Batch jobs walk this list.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<DestinationImage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM destination_images ORDER BY id");
        sqlx::query_as::<_, DestinationImage>(&query)
            .fetch_all(pool)
            .await
    }

    /// Every image with its destination's name, ordered by image ID.
    pub async fn list_all_with_destination(
        pool: &SqlitePool,
    ) -> Result<Vec<ImageWithDestination>, sqlx::Error> {
        sqlx::query_as::<_, ImageWithDestination>(
            "SELECT i.id, i.destination_id, i.image_path, i.thumbnail_path, i.caption,
                    i.is_optimized, i.created_at, i.updated_at,
                    d.name AS destination_name
             FROM destination_images i
             JOIN destinations d ON d.id = i.destination_id
             ORDER BY i.id",
        )
        .fetch_all(pool)
        .await
    }

    /// The set of storage paths referenced by any image field.
    pub async fn referenced_paths(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT image_path FROM destination_images WHERE image_path <> ''
             UNION
             SELECT thumbnail_path FROM destination_images
             WHERE thumbnail_path IS NOT NULL AND thumbnail_path <> ''",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(p,)| p).collect())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM destination_images")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Update an image. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateDestinationImage,
    ) -> Result<Option<DestinationImage>, sqlx::Error> {
        let query = format!(
            "UPDATE destination_images SET
                caption = COALESCE($2, caption),
                updated_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DestinationImage>(&query)
            .bind(id)
            .bind(&input.caption)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Point the row at a thumbnail, or clear it with `None`.
    pub async fn set_thumbnail(
        pool: &SqlitePool,
        id: DbId,
        thumbnail_path: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE destination_images SET thumbnail_path = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(thumbnail_path)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flag the primary asset as already optimized.
    pub async fn mark_optimized(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE destination_images SET is_optimized = 1, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump `updated_at` without changing anything else.
    pub async fn touch(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE destination_images SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an image row, returning it so the caller can remove its files.
    pub async fn delete_returning(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<DestinationImage>, sqlx::Error> {
        let query = format!("DELETE FROM destination_images WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, DestinationImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
