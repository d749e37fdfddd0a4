//! `sitemap.xml` and `robots.txt` generation.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tdm_db::models::destination::Destination;
use tdm_db::repositories::DestinationRepo;
use tdm_db::DbPool;

/// Static pages: (path, priority, changefreq).
const STATIC_PAGES: [(&str, &str, &str); 4] = [
    ("", "1.0", "daily"),
    ("destinations/", "0.8", "weekly"),
    ("about/", "0.5", "monthly"),
    ("contact/", "0.5", "monthly"),
];

/// Render the sitemap for `domain`. Static pages carry `today` as lastmod.
pub fn sitemap_xml(destinations: &[Destination], domain: &str, today: NaiveDate) -> String {
    let base_url = format!("https://{domain}");
    let today = today.format("%Y-%m-%d").to_string();

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#.to_string(),
    ];
    for (page, priority, changefreq) in STATIC_PAGES {
        lines.push(url_tag(&format!("{base_url}/{page}"), &today, changefreq, priority));
    }
    for destination in destinations {
        lines.push(url_tag(
            &format!("{base_url}/destinations/{}/", destination.slug),
            &destination.updated_at.format("%Y-%m-%d").to_string(),
            "weekly",
            "0.7",
        ));
    }
    lines.push("</urlset>".to_string());
    lines.join("\n")
}

fn url_tag(loc: &str, lastmod: &str, changefreq: &str, priority: &str) -> String {
    format!(
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    \
         <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>",
        xml_escape(loc)
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render `robots.txt` for `domain`.
pub fn robots_txt(domain: &str) -> String {
    [
        "User-agent: *".to_string(),
        "Disallow: /admin/".to_string(),
        "Disallow: /accounts/".to_string(),
        "Disallow: /api/".to_string(),
        "Allow: /".to_string(),
        String::new(),
        format!("Sitemap: https://{domain}/static/sitemap.xml"),
    ]
    .join("\n")
}

/// Write `sitemap.xml` into `dir`.
pub async fn write_sitemap(pool: &DbPool, dir: &Path, domain: &str) -> anyhow::Result<PathBuf> {
    let destinations = DestinationRepo::list_all(pool).await?;
    let xml = sitemap_xml(&destinations, domain, Utc::now().date_naive());
    write_file(dir, "sitemap.xml", xml).await
}

/// Write `robots.txt` into `dir`.
pub async fn write_robots(dir: &Path, domain: &str) -> anyhow::Result<PathBuf> {
    write_file(dir, "robots.txt", robots_txt(domain)).await
}

async fn write_file(dir: &Path, name: &str, contents: String) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(path)
}
