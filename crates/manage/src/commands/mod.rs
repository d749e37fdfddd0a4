//! Subcommand implementations.
//!
//! Each module exposes the operation as a function returning a report, plus
//! the printing used by the binary. Tests call the functions directly.

pub mod backup;
pub mod export;
pub mod health;
pub mod import;
pub mod media;
pub mod sample;
pub mod site;
pub mod users;

use tdm_core::imaging::ThumbnailPolicy;

use crate::cli::Command;
use crate::context::ManageContext;

/// Run one subcommand against `ctx`.
pub async fn run(ctx: &ManageContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Thumbnails {
            width,
            height,
            quality,
            force,
        } => {
            let policy = ThumbnailPolicy::new(width, height, quality);
            media::thumbnails(ctx, policy, force).await
        }
        Command::Optimize {
            quality,
            max_width,
            dry_run,
        } => media::optimize(ctx, quality, max_width, dry_run).await,
        Command::CleanupMedia { dry_run } => media::cleanup_media(ctx, dry_run).await,
        Command::CleanupDirs => media::cleanup_dirs(ctx).await,
        Command::CheckBroken => media::check_broken(ctx).await,
        Command::PurgePending => media::purge_pending(ctx).await,
        Command::MigrateStorage {
            source,
            destination,
            dry_run,
        } => media::migrate_storage(ctx, &source, &destination, dry_run).await,
        Command::Backup { output, keep } => {
            let outcome = backup::create_backup(&ctx.pool, &output, keep).await?;
            backup::print_outcome(&outcome);
            Ok(())
        }
        Command::Export { output } => {
            let output = output.unwrap_or_else(export::default_output_path);
            let count = export::write_export(ctx, &output).await?;
            println!("Exported {count} destinations to {}", output.display());
            Ok(())
        }
        Command::Import { file } => {
            let report = import::import_file(ctx, &file).await?;
            import::print_report(&report);
            Ok(())
        }
        Command::Sitemap { output, domain } => {
            let domain = domain.unwrap_or_else(|| ctx.site_domain.clone());
            let path = site::write_sitemap(&ctx.pool, &output, &domain).await?;
            println!("Sitemap generated at {}", path.display());
            Ok(())
        }
        Command::Robots { output, domain } => {
            let domain = domain.unwrap_or_else(|| ctx.site_domain.clone());
            let path = site::write_robots(&output, &domain).await?;
            println!("robots.txt generated at {}", path.display());
            Ok(())
        }
        Command::LoadSample => {
            let report = sample::load_sample(&ctx.pool).await?;
            sample::print_report(&report);
            Ok(())
        }
        Command::CheckHealth => {
            let report = health::check_health(&ctx.pool, &ctx.media.media_root).await;
            health::print_report(&report);
            Ok(())
        }
        Command::CreateUser { username, password } => {
            let user = users::create_user(&ctx.pool, &username, &password).await?;
            println!("Created user '{}' (id {})", user.username, user.id);
            Ok(())
        }
    }
}
