//! Run CPU-bound image work on the blocking pool.

use tdm_core::imaging::{self, Reencoded, ThumbnailPolicy, UploadInfo};

use crate::error::MediaResult;

pub(crate) async fn inspect_upload(data: Vec<u8>) -> MediaResult<UploadInfo> {
    let info = tokio::task::spawn_blocking(move || imaging::inspect_upload(&data)).await??;
    Ok(info)
}

pub(crate) async fn render_thumbnail(data: Vec<u8>, policy: ThumbnailPolicy) -> MediaResult<Vec<u8>> {
    let thumb =
        tokio::task::spawn_blocking(move || imaging::render_thumbnail(&data, &policy)).await??;
    Ok(thumb)
}

pub(crate) async fn reencode(data: Vec<u8>, quality: u8, max_width: u32) -> MediaResult<Reencoded> {
    let out = tokio::task::spawn_blocking(move || {
        imaging::reencode_for_storage(&data, quality, max_width)
    })
    .await??;
    Ok(out)
}
