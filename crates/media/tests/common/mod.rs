//! Shared fixtures for media integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tdm_core::storage::{MemoryStorage, Storage, StorageError, StorageResult};
use tdm_db::models::destination::{CreateDestination, Destination};
use tdm_db::repositories::DestinationRepo;
use tdm_db::DbPool;

pub async fn pool() -> DbPool {
    tdm_db::create_in_memory_pool().await.unwrap()
}

pub async fn destination(pool: &DbPool, name: &str) -> Destination {
    DestinationRepo::create(
        pool,
        &CreateDestination {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

/// A busy, deterministic RGB pattern that compresses poorly.
pub fn noisy(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(2_654_435_761).wrapping_add(y.wrapping_mul(40_503));
        Rgb([(v >> 3) as u8, (v >> 11) as u8, (x ^ y) as u8])
    })
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(noisy(width, height))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&noisy(width, height))
        .unwrap();
    buf
}

pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(noisy(width, height))
        .write_to(&mut buf, ImageFormat::Gif)
        .unwrap();
    buf.into_inner()
}

/// In-memory storage with switchable failure modes.
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    pub fail_deletes: AtomicBool,
    pub corrupt_saves: AtomicBool,
}

impl FlakyStorage {
    pub fn new(name: &str) -> Self {
        Self {
            inner: MemoryStorage::new(name),
            fail_deletes: AtomicBool::new(false),
            corrupt_saves: AtomicBool::new(false),
        }
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_corrupt_saves(&self, corrupt: bool) {
        self.corrupt_saves.store(corrupt, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        self.inner.exists(path).await
    }

    async fn open(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.inner.open(path).await
    }

    async fn save(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        if self.corrupt_saves.load(Ordering::SeqCst) {
            let mut bad = data.to_vec();
            bad.push(0xFF);
            return self.inner.save(path, &bad).await;
        }
        self.inner.save(path, data).await
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Other(format!("device busy: {path}")));
        }
        self.inner.delete(path).await
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        self.inner.size(path).await
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        self.inner.list().await
    }
}
