//! Repository for the `destinations` table.

use chrono::Utc;
use sqlx::SqlitePool;
use tdm_core::slug::{numbered_candidate, slugify};
use tdm_core::types::DbId;

use crate::is_unique_violation;
use crate::models::destination::{CreateDestination, Destination, UpdateDestination};
use crate::models::image::DestinationImage;
use crate::repositories::destination_image_repo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, weather, state, district, map_link, description, \
                       created_at, updated_at";

/// Upper bound on numbered candidates tried for a derived slug.
const MAX_DERIVED_SLUG_ATTEMPTS: u32 = 1000;

/// Provides CRUD operations for destinations.
pub struct DestinationRepo;

impl DestinationRepo {
    /// Insert a new destination, returning the created row.
    ///
    /// An explicit slug that already exists fails with a unique violation. A
    /// derived slug gets the first free `-2`, `-3`, ... suffix instead.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateDestination,
    ) -> Result<Destination, sqlx::Error> {
        if let Some(slug) = input.slug.as_deref().filter(|s| !s.is_empty()) {
            return Self::insert(pool, input, slug).await;
        }

        let base = slugify(&input.name);
        let mut last_err = None;
        for n in 1..=MAX_DERIVED_SLUG_ATTEMPTS {
            let candidate = numbered_candidate(&base, n);
            if Self::slug_exists(pool, &candidate).await? {
                continue;
            }
            match Self::insert(pool, input, &candidate).await {
                Ok(destination) => return Ok(destination),
                // Lost a race for this candidate; try the next one.
                Err(e) if is_unique_violation(&e) => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            sqlx::Error::Protocol(format!("no free slug derived from '{base}'"))
        }))
    }

    async fn insert(
        pool: &SqlitePool,
        input: &CreateDestination,
        slug: &str,
    ) -> Result<Destination, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO destinations
                (name, slug, weather, state, district, map_link, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.weather)
            .bind(&input.state)
            .bind(&input.district)
            .bind(&input.map_link)
            .bind(&input.description)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Insert or overwrite the destination with a caller-chosen primary key.
    ///
    /// Used by the JSON import, which addresses records by `pk`.
    pub async fn upsert_with_id(
        pool: &SqlitePool,
        id: DbId,
        input: &CreateDestination,
        slug: &str,
    ) -> Result<Destination, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO destinations
                (id, name, slug, weather, state, district, map_link, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug,
                weather = excluded.weather,
                state = excluded.state,
                district = excluded.district,
                map_link = excluded.map_link,
                description = excluded.description,
                updated_at = excluded.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.weather)
            .bind(&input.state)
            .bind(&input.district)
            .bind(&input.map_link)
            .bind(&input.description)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a destination by its internal ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Destination>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM destinations WHERE id = $1");
        sqlx::query_as::<_, Destination>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a destination by slug.
    pub async fn find_by_slug(
        pool: &SqlitePool,
        slug: &str,
    ) -> Result<Option<Destination>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM destinations WHERE slug = $1");
        sqlx::query_as::<_, Destination>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find the first destination with exactly this display name.
    pub async fn find_by_name(
        pool: &SqlitePool,
        name: &str,
    ) -> Result<Option<Destination>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM destinations WHERE name = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, Destination>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn slug_exists(pool: &SqlitePool, slug: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM destinations WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// List destinations ordered by name.
    pub async fn list(
        pool: &SqlitePool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Destination>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM destinations
             ORDER BY name, id
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every destination, ordered by ID.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Destination>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM destinations ORDER BY id");
        sqlx::query_as::<_, Destination>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM destinations")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Update a destination. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateDestination,
    ) -> Result<Option<Destination>, sqlx::Error> {
        let query = format!(
            "UPDATE destinations SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                weather = COALESCE($4, weather),
                state = COALESCE($5, state),
                district = COALESCE($6, district),
                map_link = COALESCE($7, map_link),
                description = COALESCE($8, description),
                updated_at = $9
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Destination>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.weather)
            .bind(&input.state)
            .bind(&input.district)
            .bind(&input.map_link)
            .bind(&input.description)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Delete a destination by ID. Images cascade. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM destinations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a destination and its images in one transaction.
    ///
    /// Returns the removed image rows so the caller can clean up their files,
    /// or `None` if the destination does not exist.
    pub async fn delete_with_images(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<Vec<DestinationImage>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {} FROM destination_images WHERE destination_id = $1 ORDER BY id",
            destination_image_repo::COLUMNS
        );
        let images = sqlx::query_as::<_, DestinationImage>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM destination_images WHERE destination_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM destinations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(images))
    }
}
