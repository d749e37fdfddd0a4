use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tdm_core::imaging::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_WIDTH, DEFAULT_THUMBNAIL_HEIGHT, DEFAULT_THUMBNAIL_WIDTH,
};
use tdm_core::storage::DEFAULT_BACKEND;

#[derive(Debug, Parser)]
#[command(name = "tdm-manage")]
#[command(about = "Maintenance commands for the tourist destination manager")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Derive missing thumbnails for every destination image.
    Thumbnails {
        /// Bounding box width.
        #[arg(long, default_value_t = DEFAULT_THUMBNAIL_WIDTH)]
        width: u32,
        #[arg(long, default_value_t = DEFAULT_THUMBNAIL_HEIGHT)]
        height: u32,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Regenerate thumbnails that already exist.
        #[arg(long)]
        force: bool,
    },
    /// Re-encode primary images in place when that saves at least 10%.
    Optimize {
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Images wider than this are downscaled (min 100).
        #[arg(long, default_value_t = DEFAULT_MAX_WIDTH)]
        max_width: u32,
        /// Report what would change without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete media files no image row references.
    CleanupMedia {
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove empty directories under the media root.
    CleanupDirs,
    /// List image rows whose files are missing or unreadable.
    CheckBroken,
    /// Retry file deletions that failed after their rows were removed.
    PurgePending,
    /// Copy every referenced file from one storage backend to another.
    MigrateStorage {
        #[arg(long, default_value = DEFAULT_BACKEND)]
        source: String,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Snapshot the database and keep only the most recent backups.
    Backup {
        #[arg(long, default_value = "backups")]
        output: PathBuf,
        /// Number of backups to keep (at least 1).
        #[arg(long, default_value_t = 5)]
        keep: usize,
    },
    /// Export destinations with their images as JSON.
    Export {
        /// Output file (default: exports/destinations_export_{timestamp}.json).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import destinations from a JSON export.
    Import { file: PathBuf },
    /// Write sitemap.xml.
    Sitemap {
        #[arg(long, default_value = "static")]
        output: PathBuf,
        /// Site host name (default: SITE_DOMAIN).
        #[arg(long)]
        domain: Option<String>,
    },
    /// Write robots.txt.
    Robots {
        #[arg(long, default_value = "static")]
        output: PathBuf,
        #[arg(long)]
        domain: Option<String>,
    },
    /// Create the sample destinations if they do not exist.
    LoadSample,
    /// Check database connectivity and the media root.
    CheckHealth,
    /// Create an API user.
    CreateUser {
        username: String,
        #[arg(long)]
        password: String,
    },
}
