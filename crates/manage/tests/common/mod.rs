#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use tdm_core::storage::{MediaSettings, MemoryStorage, StorageRegistry};
use tdm_db::models::destination::{CreateDestination, Destination};
use tdm_db::repositories::DestinationRepo;
use tdm_manage::context::ManageContext;

pub const MEDIA_URL: &str = "http://media.test/media/";

/// Handles on the in-memory backends behind a test context.
pub struct Backends {
    pub default: Arc<MemoryStorage>,
    pub archive: Arc<MemoryStorage>,
}

/// Context over an in-memory database and in-memory `default`/`archive` backends.
pub async fn context(media_root: &Path) -> (ManageContext, Backends) {
    let pool = tdm_db::create_in_memory_pool()
        .await
        .expect("in-memory pool should be created");
    let media = MediaSettings::new(media_root, MEDIA_URL, BTreeMap::new());

    let backends = Backends {
        default: Arc::new(MemoryStorage::new("default")),
        archive: Arc::new(MemoryStorage::new("archive")),
    };
    let mut registry = StorageRegistry::new();
    registry.insert(backends.default.clone());
    registry.insert(backends.archive.clone());

    let ctx = ManageContext::new(pool, media, "tdm.example").with_registry(registry);
    (ctx, backends)
}

pub async fn destination(ctx: &ManageContext, name: &str) -> Destination {
    let input = CreateDestination {
        name: name.to_string(),
        ..Default::default()
    };
    DestinationRepo::create(&ctx.pool, &input)
        .await
        .expect("destination should be created")
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encoding should succeed");
    out.into_inner()
}
