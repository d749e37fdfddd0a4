//! Consistent SQLite snapshots with rotation.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use chrono::{DateTime, Local};
use tdm_db::DbPool;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_SUFFIX: &str = ".sqlite3";

/// Result of one backup run.
#[derive(Debug)]
pub struct BackupOutcome {
    pub path: PathBuf,
    /// Older backups deleted by rotation.
    pub removed: Vec<PathBuf>,
    /// Rotation failures; the new backup itself succeeded.
    pub errors: Vec<String>,
}

/// `backup_{YYYYmmdd_HHMMSS}.sqlite3` for `now`.
pub fn backup_file_name(now: DateTime<Local>) -> String {
    format!("{BACKUP_PREFIX}{}{BACKUP_SUFFIX}", now.format("%Y%m%d_%H%M%S"))
}

/// Snapshot the database into `dir`, then keep only the `keep` newest backups.
///
/// `keep` is raised to at least 1. A failed snapshot removes the partial file.
pub async fn create_backup(pool: &DbPool, dir: &Path, keep: usize) -> anyhow::Result<BackupOutcome> {
    let keep = keep.max(1);
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create backup directory '{}'", dir.display()))?;

    let path = dir.join(backup_file_name(Local::now()));
    let target = path
        .to_str()
        .with_context(|| format!("Backup path '{}' is not valid UTF-8", path.display()))?;

    tracing::info!(path = %path.display(), "Backing up database");
    if let Err(e) = tdm_db::vacuum_into(pool, target).await {
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %rm, "Failed to remove partial backup");
            }
        }
        return Err(e).context("Backup failed");
    }

    let (removed, errors) = prune_backups(dir, keep).await;
    Ok(BackupOutcome {
        path,
        removed,
        errors,
    })
}

/// Delete all but the `keep` most recently modified `backup_*.sqlite3` files in `dir`.
pub async fn prune_backups(dir: &Path, keep: usize) -> (Vec<PathBuf>, Vec<String>) {
    let mut removed = Vec::new();
    let mut errors = Vec::new();

    let mut backups: Vec<(SystemTime, PathBuf)> = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("{}: {e}", dir.display()));
            return (removed, errors);
        }
    };
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                errors.push(format!("{}: {e}", dir.display()));
                break;
            }
        };
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX)) {
            continue;
        }
        match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => backups.push((modified, entry.path())),
            Err(e) => errors.push(format!("{}: {e}", entry.path().display())),
        }
    }

    // Newest first; ties broken by name so the timestamped names decide.
    backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    for (_, path) in backups.into_iter().skip(keep) {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed old backup");
                removed.push(path);
            }
            Err(e) => errors.push(format!("{}: {e}", path.display())),
        }
    }
    (removed, errors)
}

pub fn print_outcome(outcome: &BackupOutcome) {
    for path in &outcome.removed {
        println!("  removed old backup: {}", path.display());
    }
    for error in &outcome.errors {
        println!("  error cleaning up old backups: {error}");
    }
    println!("Backup written to {}", outcome.path.display());
}
