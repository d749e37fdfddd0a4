//! Installation health report.

use std::path::{Path, PathBuf};

use tdm_db::repositories::{DestinationImageRepo, DestinationRepo, PendingCleanupRepo};
use tdm_db::DbPool;

/// Database and media-root status.
#[derive(Debug)]
pub struct HealthReport {
    pub database_error: Option<String>,
    pub media_root: PathBuf,
    pub media_root_exists: bool,
    pub media_root_writable: bool,
    pub destinations: Option<i64>,
    pub images: Option<i64>,
    pub pending_cleanups: Option<i64>,
}

impl HealthReport {
    pub fn database_ok(&self) -> bool {
        self.database_error.is_none()
    }
}

/// Probe the database and the media root. Never fails; problems are reported.
pub async fn check_health(pool: &DbPool, media_root: &Path) -> HealthReport {
    let database_error = tdm_db::health_check(pool).await.err().map(|e| e.to_string());
    let (destinations, images, pending_cleanups) = if database_error.is_none() {
        (
            DestinationRepo::count(pool).await.ok(),
            DestinationImageRepo::count(pool).await.ok(),
            PendingCleanupRepo::count(pool).await.ok(),
        )
    } else {
        (None, None, None)
    };

    let media_root_exists = tokio::fs::metadata(media_root)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    let media_root_writable = media_root_exists && probe_writable(media_root).await;

    HealthReport {
        database_error,
        media_root: media_root.to_path_buf(),
        media_root_exists,
        media_root_writable,
        destinations,
        images,
        pending_cleanups,
    }
}

/// Write and remove a hidden probe file.
async fn probe_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".tdm_health_probe_{}", std::process::id()));
    if tokio::fs::write(&probe, b"ok").await.is_err() {
        return false;
    }
    if let Err(e) = tokio::fs::remove_file(&probe).await {
        tracing::warn!(path = %probe.display(), error = %e, "Failed to remove health probe");
    }
    true
}

fn count(value: Option<i64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |n| n.to_string())
}

pub fn print_report(report: &HealthReport) {
    println!("=== System Health Check ===");
    match &report.database_error {
        None => println!("Database connection: OK"),
        Some(e) => println!("Database connection error: {e}"),
    }
    let root = report.media_root.display();
    if !report.media_root_exists {
        println!("Media directory does not exist: {root}");
    } else if report.media_root_writable {
        println!("Media directory is writable: {root}");
    } else {
        println!("Media directory is not writable: {root}");
    }
    println!(
        "Rows: {} destinations, {} images, {} pending file cleanups",
        count(report.destinations),
        count(report.images),
        count(report.pending_cleanups)
    );
    println!("=== Health check completed ===");
}
