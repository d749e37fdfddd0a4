//! Thin wrappers that run the media jobs and print their summaries.

use tdm_core::imaging::ThumbnailPolicy;
use tdm_core::units::format_bytes;
use tdm_media::jobs::broken::{check_broken_references, ImageField};
use tdm_media::jobs::cleanup::{cleanup_unused_files, prune_empty_dirs};
use tdm_media::jobs::migrate::migrate_storage as run_migration;
use tdm_media::jobs::optimize::{optimize_images, OptimizeDecision, OptimizeOptions};
use tdm_media::jobs::thumbnails::{generate_thumbnails, ThumbnailJobOptions};
use tdm_media::lifecycle;

use crate::context::ManageContext;

pub async fn thumbnails(
    ctx: &ManageContext,
    policy: ThumbnailPolicy,
    force: bool,
) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let options = ThumbnailJobOptions { policy, force };
    let report = generate_thumbnails(&ctx.pool, storage.as_ref(), &options).await?;

    for error in &report.errors {
        println!("  failed: {error}");
    }
    println!(
        "Thumbnails: {} created, {} skipped, {} failed",
        report.created, report.skipped, report.failed
    );
    Ok(())
}

pub async fn optimize(
    ctx: &ManageContext,
    quality: u8,
    max_width: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let options = OptimizeOptions {
        quality,
        max_width,
        dry_run,
    };
    let report = optimize_images(&ctx.pool, storage.as_ref(), options).await?;

    for item in &report.items {
        match (item.decision, item.size_before, item.size_after) {
            (OptimizeDecision::Optimized | OptimizeDecision::WouldOptimize, Some(before), Some(after)) => {
                println!(
                    "  {}: {} ({} -> {}, {:.1}% smaller)",
                    item.decision.label(),
                    item.path,
                    format_bytes(before),
                    format_bytes(after),
                    item.reduction_percent.unwrap_or_default()
                );
            }
            (decision, _, _) => match &item.detail {
                Some(detail) => println!("  {}: {} ({detail})", decision.label(), item.path),
                None => println!("  {}: {}", decision.label(), item.path),
            },
        }
    }

    let verb = if report.dry_run { "would be optimized" } else { "optimized" };
    println!(
        "Optimize: {} {verb}, {} skipped, {} errors, {} saved",
        report.optimized,
        report.skipped,
        report.errors,
        format_bytes(report.bytes_saved)
    );
    Ok(())
}

pub async fn cleanup_media(ctx: &ManageContext, dry_run: bool) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let report = cleanup_unused_files(&ctx.pool, storage.as_ref(), dry_run).await?;

    let verb = if report.dry_run { "would delete" } else { "deleted" };
    for path in &report.unused_files {
        println!("  {verb}: {path}");
    }
    for error in &report.errors {
        println!("  error: {error}");
    }
    for dir in &report.dirs_removed {
        println!("  removed empty directory: {dir}");
    }
    println!(
        "Cleanup: scanned {} files, {} {} unused files ({}), {} errors",
        report.files_scanned,
        verb,
        report.unused_files.len(),
        format_bytes(report.bytes_reclaimed),
        report.errors.len()
    );
    Ok(())
}

pub async fn cleanup_dirs(ctx: &ManageContext) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let removed = prune_empty_dirs(storage.as_ref()).await?;
    for dir in &removed {
        println!("  removed: {dir}");
    }
    println!("Removed {} empty directories", removed.len());
    Ok(())
}

pub async fn check_broken(ctx: &ManageContext) -> anyhow::Result<()> {
    let storage = ctx.storage()?;
    let report = check_broken_references(&ctx.pool, storage.as_ref()).await?;

    for broken in &report.broken {
        let field = match broken.field {
            ImageField::Image => "image",
            ImageField::Thumbnail => "thumbnail",
        };
        println!(
            "  {} (image {}, {field}): {} [{}]",
            broken.destination_name, broken.image_id, broken.reason, broken.path
        );
    }
    println!(
        "Checked {} images, found {} broken references",
        report.images_checked,
        report.broken.len()
    );
    Ok(())
}

pub async fn purge_pending(ctx: &ManageContext) -> anyhow::Result<()> {
    let report = lifecycle::purge_pending(&ctx.pool, &ctx.registry).await?;
    for error in &report.errors {
        println!("  still failing: {error}");
    }
    println!(
        "Pending cleanups: {} resolved, {} still failing",
        report.resolved, report.failed
    );
    Ok(())
}

pub async fn migrate_storage(
    ctx: &ManageContext,
    source: &str,
    destination: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let report = run_migration(&ctx.pool, &ctx.registry, source, destination, dry_run).await?;

    for failure in &report.failures {
        println!("  error: {failure}");
    }
    let prefix = if report.dry_run { "[dry run] " } else { "" };
    println!(
        "{prefix}Migrated {} images ({} files) from '{}' to '{}': {} skipped, {} errors",
        report.migrated,
        report.files_copied,
        report.source,
        report.destination,
        report.skipped,
        report.errors
    );
    Ok(())
}
