//! Integration tests for destination and image persistence.
//!
//! - Slug derivation and collision handling
//! - Partial updates never re-derive the slug
//! - Cascade and transactional deletes
//! - Referenced-path collection for cleanup

use tdm_db::models::destination::{CreateDestination, UpdateDestination};
use tdm_db::models::image::{CreateDestinationImage, UpdateDestinationImage};
use tdm_db::repositories::{DestinationImageRepo, DestinationRepo, PendingCleanupRepo, UserRepo};
use tdm_db::{is_unique_violation, DbPool};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn pool() -> DbPool {
    tdm_db::create_in_memory_pool().await.unwrap()
}

fn new_destination(name: &str) -> CreateDestination {
    CreateDestination {
        name: name.to_string(),
        weather: "Sunny".to_string(),
        state: "Uttar Pradesh".to_string(),
        district: "Agra".to_string(),
        ..Default::default()
    }
}

fn new_image(destination_id: i64, path: &str) -> CreateDestinationImage {
    CreateDestinationImage {
        destination_id,
        image_path: path.to_string(),
        caption: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_slug_derived_from_name() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Taj Mahal"))
        .await
        .unwrap();
    assert_eq!(dest.slug, "taj-mahal");
    assert_eq!(dest.created_at, dest.updated_at);
}

#[tokio::test]
async fn test_slug_folds_accented_names() {
    let pool = pool().await;
    let cafe = DestinationRepo::create(&pool, &new_destination("Café Goa")).await.unwrap();
    let ooty = DestinationRepo::create(&pool, &new_destination("Ooty Śrī")).await.unwrap();
    assert_eq!(cafe.slug, "cafe-goa");
    assert_eq!(ooty.slug, "ooty-sri");
}

#[tokio::test]
async fn test_derived_slug_collision_gets_suffix() {
    let pool = pool().await;
    let a = DestinationRepo::create(&pool, &new_destination("Taj Mahal")).await.unwrap();
    let b = DestinationRepo::create(&pool, &new_destination("Taj Mahal")).await.unwrap();
    let c = DestinationRepo::create(&pool, &new_destination("Taj  Mahal!")).await.unwrap();
    assert_eq!(a.slug, "taj-mahal");
    assert_eq!(b.slug, "taj-mahal-2");
    assert_eq!(c.slug, "taj-mahal-3");
}

#[tokio::test]
async fn test_explicit_duplicate_slug_is_rejected() {
    let pool = pool().await;
    DestinationRepo::create(&pool, &new_destination("Golden Temple")).await.unwrap();

    let mut input = new_destination("Another Temple");
    input.slug = Some("golden-temple".to_string());
    let err = DestinationRepo::create(&pool, &input).await.unwrap_err();
    assert!(is_unique_violation(&err));
}

#[tokio::test]
async fn test_empty_explicit_slug_is_derived() {
    let pool = pool().await;
    let mut input = new_destination("Hawa Mahal");
    input.slug = Some(String::new());
    let dest = DestinationRepo::create(&pool, &input).await.unwrap();
    assert_eq!(dest.slug, "hawa-mahal");
}

#[tokio::test]
async fn test_update_keeps_slug() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Qutub Minar")).await.unwrap();

    let updated = DestinationRepo::update(
        &pool,
        dest.id,
        &UpdateDestination {
            name: Some("Qutb Minar".to_string()),
            description: Some("A minaret".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.name, "Qutb Minar");
    assert_eq!(updated.slug, "qutub-minar");
    assert_eq!(updated.description, "A minaret");
    assert_eq!(updated.weather, "Sunny");
    assert!(updated.updated_at >= dest.updated_at);
}

#[tokio::test]
async fn test_update_missing_returns_none() {
    let pool = pool().await;
    let result = DestinationRepo::update(&pool, 999, &UpdateDestination::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_find_list_count() {
    let pool = pool().await;
    for name in ["Munnar", "Alleppey", "Kovalam"] {
        DestinationRepo::create(&pool, &new_destination(name)).await.unwrap();
    }

    assert_eq!(DestinationRepo::count(&pool).await.unwrap(), 3);
    let page = DestinationRepo::list(&pool, 2, 0).await.unwrap();
    let names: Vec<_> = page.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Alleppey", "Kovalam"]);

    let found = DestinationRepo::find_by_slug(&pool, "munnar").await.unwrap().unwrap();
    assert_eq!(found.name, "Munnar");
    assert!(DestinationRepo::find_by_name(&pool, "Kovalam").await.unwrap().is_some());
    assert!(DestinationRepo::slug_exists(&pool, "alleppey").await.unwrap());
    assert!(!DestinationRepo::slug_exists(&pool, "goa").await.unwrap());
}

#[tokio::test]
async fn test_upsert_with_id() {
    let pool = pool().await;
    let created = DestinationRepo::upsert_with_id(&pool, 42, &new_destination("Ooty"), "ooty")
        .await
        .unwrap();
    assert_eq!(created.id, 42);

    let mut changed = new_destination("Ooty Hills");
    changed.description = "Nilgiris".to_string();
    let updated = DestinationRepo::upsert_with_id(&pool, 42, &changed, "ooty")
        .await
        .unwrap();
    assert_eq!(updated.id, 42);
    assert_eq!(updated.name, "Ooty Hills");
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(DestinationRepo::count(&pool).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_image_lifecycle_columns() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Goa")).await.unwrap();
    let img = DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/a.jpg"))
        .await
        .unwrap();
    assert!(img.thumbnail_path.is_none());
    assert!(!img.is_optimized);

    DestinationImageRepo::set_thumbnail(&pool, img.id, Some("thumbnails/thumb_a.jpg"))
        .await
        .unwrap();
    DestinationImageRepo::mark_optimized(&pool, img.id).await.unwrap();
    let updated = DestinationImageRepo::update(
        &pool,
        img.id,
        &UpdateDestinationImage {
            caption: Some("Beach".to_string()),
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.thumbnail_path.as_deref(), Some("thumbnails/thumb_a.jpg"));
    assert!(updated.is_optimized);
    assert_eq!(updated.caption, "Beach");

    DestinationImageRepo::set_thumbnail(&pool, img.id, None).await.unwrap();
    let cleared = DestinationImageRepo::find_by_id(&pool, img.id).await.unwrap().unwrap();
    assert!(cleared.thumbnail_path.is_none());
}

#[tokio::test]
async fn test_image_scoped_to_destination() {
    let pool = pool().await;
    let a = DestinationRepo::create(&pool, &new_destination("A")).await.unwrap();
    let b = DestinationRepo::create(&pool, &new_destination("B")).await.unwrap();
    let img = DestinationImageRepo::create(&pool, &new_image(a.id, "destinations/1/a.jpg"))
        .await
        .unwrap();

    assert!(DestinationImageRepo::find_for_destination(&pool, a.id, img.id)
        .await
        .unwrap()
        .is_some());
    assert!(DestinationImageRepo::find_for_destination(&pool, b.id, img.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_image_requires_existing_destination() {
    let pool = pool().await;
    let result = DestinationImageRepo::create(&pool, &new_image(12345, "destinations/12345/x.jpg")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_by_destinations() {
    let pool = pool().await;
    let a = DestinationRepo::create(&pool, &new_destination("A")).await.unwrap();
    let b = DestinationRepo::create(&pool, &new_destination("B")).await.unwrap();
    let c = DestinationRepo::create(&pool, &new_destination("C")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(a.id, "destinations/1/a.jpg")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(b.id, "destinations/2/b.jpg")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(c.id, "destinations/3/c.jpg")).await.unwrap();

    let images = DestinationImageRepo::list_by_destinations(&pool, &[a.id, c.id]).await.unwrap();
    let paths: Vec<_> = images.iter().map(|i| i.image_path.as_str()).collect();
    assert_eq!(paths, vec!["destinations/1/a.jpg", "destinations/3/c.jpg"]);
    assert!(DestinationImageRepo::list_by_destinations(&pool, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_referenced_paths_include_thumbnails() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Hampi")).await.unwrap();
    let a = DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/a.jpg"))
        .await
        .unwrap();
    DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/b.jpg"))
        .await
        .unwrap();
    DestinationImageRepo::set_thumbnail(&pool, a.id, Some("thumbnails/thumb_a.jpg"))
        .await
        .unwrap();

    let mut paths = DestinationImageRepo::referenced_paths(&pool).await.unwrap();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "destinations/1/a.jpg".to_string(),
            "destinations/1/b.jpg".to_string(),
            "thumbnails/thumb_a.jpg".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_list_all_with_destination_name() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Khajuraho")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/k.jpg"))
        .await
        .unwrap();
    let rows = DestinationImageRepo::list_all_with_destination(&pool).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].destination_name, "Khajuraho");
    assert_eq!(rows[0].image.image_path, "destinations/1/k.jpg");
}

// ---------------------------------------------------------------------------
// Deletes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_cascades_to_images() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Jaipur")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/a.jpg")).await.unwrap();

    assert!(DestinationRepo::delete(&pool, dest.id).await.unwrap());
    assert_eq!(DestinationImageRepo::count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_with_images_returns_rows() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Udaipur")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/a.jpg")).await.unwrap();
    DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/b.jpg")).await.unwrap();

    let removed = DestinationRepo::delete_with_images(&pool, dest.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(DestinationRepo::count(&pool).await.unwrap(), 0);
    assert_eq!(DestinationImageRepo::count(&pool).await.unwrap(), 0);

    assert!(DestinationRepo::delete_with_images(&pool, dest.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_image_returning() {
    let pool = pool().await;
    let dest = DestinationRepo::create(&pool, &new_destination("Pune")).await.unwrap();
    let img = DestinationImageRepo::create(&pool, &new_image(dest.id, "destinations/1/p.jpg"))
        .await
        .unwrap();
    let removed = DestinationImageRepo::delete_returning(&pool, img.id).await.unwrap().unwrap();
    assert_eq!(removed.image_path, "destinations/1/p.jpg");
    assert!(DestinationImageRepo::delete_returning(&pool, img.id).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Pending cleanups and users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pending_cleanup_upsert_and_resolve() {
    let pool = pool().await;
    let first = PendingCleanupRepo::record(&pool, "default", "destinations/1/a.jpg", "busy")
        .await
        .unwrap();
    assert_eq!(first.attempts, 1);
    let second = PendingCleanupRepo::record(&pool, "default", "destinations/1/a.jpg", "still busy")
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.attempts, 2);
    assert_eq!(second.last_error.as_deref(), Some("still busy"));

    PendingCleanupRepo::record_failure(&pool, first.id, "again").await.unwrap();
    let listed = PendingCleanupRepo::list(&pool).await.unwrap();
    assert_eq!(listed[0].attempts, 3);

    assert!(PendingCleanupRepo::resolve(&pool, first.id).await.unwrap());
    assert_eq!(PendingCleanupRepo::count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_unique_username() {
    let pool = pool().await;
    let input = tdm_db::models::user::CreateUser {
        username: "admin".to_string(),
        password_hash: "$argon2id$stub".to_string(),
    };
    let user = UserRepo::create(&pool, &input).await.unwrap();
    assert!(user.is_active);

    let err = UserRepo::create(&pool, &input).await.unwrap_err();
    assert!(is_unique_violation(&err));

    UserRepo::set_active(&pool, user.id, false).await.unwrap();
    let found = UserRepo::find_by_username(&pool, "admin").await.unwrap().unwrap();
    assert!(!found.is_active);
}
