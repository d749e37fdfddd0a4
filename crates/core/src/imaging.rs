//! Image decode / resize / encode operations.
//!
//! Pure CPU work on in-memory buffers. Callers on an async runtime should run
//! these through `tokio::task::spawn_blocking`.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};

/// Default thumbnail bounding-box width.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 300;

/// Default thumbnail bounding-box height.
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 200;

/// Default JPEG quality for thumbnails and optimized JPEGs.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Default maximum width kept by the optimization job.
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Smallest `max_width` the optimization job accepts.
pub const MIN_MAX_WIDTH: u32 = 100;

/// A re-encode must shrink the file below this fraction of the original.
pub const MIN_REDUCTION_RATIO: f64 = 0.9;

#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Unsupported image format: {0}")]
    Unsupported(String),
}

// ---------------------------------------------------------------------------
// Thumbnails
// ---------------------------------------------------------------------------

/// The single thumbnail policy shared by the upload path and the batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailPolicy {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for ThumbnailPolicy {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_THUMBNAIL_WIDTH,
            max_height: DEFAULT_THUMBNAIL_HEIGHT,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ThumbnailPolicy {
    /// Clamp caller-supplied values into a usable range.
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
            quality: clamp_quality(quality),
        }
    }
}

/// Render a JPEG thumbnail of `data` that fits inside the policy's box.
///
/// Images with an alpha channel are composited onto white first. Images that
/// already fit are re-encoded at their original size, never upscaled.
pub fn render_thumbnail(data: &[u8], policy: &ThumbnailPolicy) -> Result<Vec<u8>, ImagingError> {
    let img = image::load_from_memory(data).map_err(ImagingError::Decode)?;
    let rgb = flatten_onto_white(&img);

    let (width, height) = rgb.dimensions();
    let (target_w, target_h) = fit_within(width, height, policy.max_width, policy.max_height);
    let rgb = if (target_w, target_h) == (width, height) {
        rgb
    } else {
        image::imageops::resize(&rgb, target_w, target_h, FilterType::Lanczos3)
    };

    encode_jpeg(&rgb, policy.quality)
}

/// Largest size with the same aspect ratio that fits inside `max_w` x `max_h`.
///
/// Returns the input unchanged when it already fits.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = f64::min(max_w as f64 / width as f64, max_h as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Drop the alpha channel by compositing onto an opaque white background.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let blend = |c: u8| -> u8 {
            let a = u32::from(a);
            ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8
        };
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, clamp_quality(quality))
        .encode_image(rgb)
        .map_err(ImagingError::Encode)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Optimization
// ---------------------------------------------------------------------------

/// Result of re-encoding a stored image for size.
#[derive(Debug, Clone)]
pub struct Reencoded {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Whether the image was downscaled to fit `max_width`.
    pub resized: bool,
}

/// Re-encode a JPEG or PNG, downscaling to `max_width` when wider.
///
/// JPEGs are written as RGB at `quality`; PNGs with best compression and
/// adaptive filtering. Any other recognised format yields
/// [`ImagingError::Unsupported`].
pub fn reencode_for_storage(
    data: &[u8],
    quality: u8,
    max_width: u32,
) -> Result<Reencoded, ImagingError> {
    let format = image::guess_format(data).map_err(ImagingError::Decode)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(ImagingError::Unsupported(format!("{format:?}")));
    }

    let mut img =
        image::load_from_memory_with_format(data, format).map_err(ImagingError::Decode)?;

    let max_width = max_width.max(MIN_MAX_WIDTH);
    let (width, height) = img.dimensions();
    let resized = width > max_width;
    if resized {
        let ratio = max_width as f64 / width as f64;
        let new_height = ((height as f64 * ratio) as u32).max(1);
        img = img.resize_exact(max_width, new_height, FilterType::Lanczos3);
    }

    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, clamp_quality(quality))
                .encode_image(&rgb)
                .map_err(ImagingError::Encode)?;
        }
        _ => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(ImagingError::Encode)?;
        }
    }

    let (width, height) = img.dimensions();
    Ok(Reencoded {
        data: buf,
        format,
        width,
        height,
        resized,
    })
}

/// Whether replacing a file of `original` bytes with `candidate` bytes is
/// worth a lossy rewrite (at least a ~10% reduction).
pub fn is_worthwhile_reduction(original: u64, candidate: u64) -> bool {
    (candidate as f64) < (original as f64) * MIN_REDUCTION_RATIO
}

/// Encoding and dimensions of an upload that decoded cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Fully decode an upload.
///
/// Magic bytes alone are not enough: a truncated or corrupt body, or an
/// encoding whose decoder is not compiled in, would be stored and then fail
/// every thumbnail pass.
pub fn inspect_upload(data: &[u8]) -> Result<UploadInfo, ImagingError> {
    let format = image::guess_format(data).map_err(ImagingError::Decode)?;
    let img = image::load_from_memory_with_format(data, format).map_err(ImagingError::Decode)?;
    Ok(UploadInfo {
        format,
        width: img.width(),
        height: img.height(),
    })
}

/// Clamp a JPEG quality into `1..=100`.
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

/// MIME type for a stored file, guessed from its extension.
pub fn mime_type_for_path(path: &str) -> &'static str {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use image::{Rgb, Rgba, RgbaImage};

    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn jpeg_bytes(img: &RgbImage, quality: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(img)
            .unwrap();
        buf
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        assert_eq!(fit_within(600, 400, 300, 200), (300, 200));
        assert_eq!(fit_within(1000, 500, 300, 200), (300, 150));
        assert_eq!(fit_within(400, 1000, 300, 200), (80, 200));
    }

    #[test]
    fn fit_within_never_upscales() {
        assert_eq!(fit_within(120, 80, 300, 200), (120, 80));
    }

    #[test]
    fn fit_within_keeps_one_pixel_minimum() {
        assert_eq!(fit_within(10_000, 1, 300, 200), (300, 1));
    }

    #[test]
    fn thumbnail_fits_box_and_is_jpeg() {
        let src = png_bytes(&DynamicImage::ImageRgb8(gradient(900, 600)));
        let thumb = render_thumbnail(&src, &ThumbnailPolicy::default()).unwrap();

        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (300, 200));
    }

    #[test]
    fn thumbnail_of_small_image_keeps_size() {
        let src = png_bytes(&DynamicImage::ImageRgb8(gradient(40, 30)));
        let thumb = render_thumbnail(&src, &ThumbnailPolicy::default()).unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let rgba = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(3, 3), &Rgb([255, 255, 255]));
    }

    #[test]
    fn opaque_pixels_are_unchanged_by_flattening() {
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn thumbnail_of_rgba_png_succeeds() {
        let rgba = RgbaImage::from_pixel(500, 500, Rgba([200, 10, 10, 128]));
        let src = png_bytes(&DynamicImage::ImageRgba8(rgba));
        let thumb = render_thumbnail(&src, &ThumbnailPolicy::default()).unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (200, 200));
    }

    #[test]
    fn thumbnail_of_garbage_fails_with_decode_error() {
        let result = render_thumbnail(b"definitely not an image", &ThumbnailPolicy::default());
        assert_matches!(result, Err(ImagingError::Decode(_)));
    }

    #[test]
    fn policy_clamps_values() {
        let policy = ThumbnailPolicy::new(0, 0, 0);
        assert_eq!(policy.max_width, 1);
        assert_eq!(policy.max_height, 1);
        assert_eq!(policy.quality, 1);
        assert_eq!(ThumbnailPolicy::new(300, 200, 250).quality, 100);
    }

    #[test]
    fn reencode_downscales_wide_images() {
        let src = jpeg_bytes(&gradient(2400, 1200), 100);
        let out = reencode_for_storage(&src, 85, 1920).unwrap();
        assert!(out.resized);
        assert_eq!((out.width, out.height), (1920, 960));
        assert_eq!(out.format, ImageFormat::Jpeg);
        assert!(is_worthwhile_reduction(src.len() as u64, out.data.len() as u64));
    }

    #[test]
    fn reencode_keeps_png_as_png() {
        let src = png_bytes(&DynamicImage::ImageRgb8(gradient(64, 64)));
        let out = reencode_for_storage(&src, 85, 1920).unwrap();
        assert!(!out.resized);
        assert_eq!(out.format, ImageFormat::Png);
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn reencode_rejects_other_formats() {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(gradient(16, 16))
            .write_to(&mut buf, ImageFormat::Gif)
            .unwrap();
        let result = reencode_for_storage(&buf.into_inner(), 85, 1920);
        assert_matches!(result, Err(ImagingError::Unsupported(_)));
    }

    #[test]
    fn reduction_gate_matches_ten_percent_rule() {
        assert!(is_worthwhile_reduction(500 * 1024, 449 * 1024));
        assert!(!is_worthwhile_reduction(100 * 1024, 98 * 1024));
        assert!(!is_worthwhile_reduction(1000, 900));
        assert!(!is_worthwhile_reduction(1000, 1200));
    }

    #[test]
    fn inspect_accepts_decodable_images() {
        let png = png_bytes(&DynamicImage::ImageRgb8(gradient(6, 4)));
        assert_eq!(
            inspect_upload(&png).unwrap(),
            UploadInfo {
                format: ImageFormat::Png,
                width: 6,
                height: 4,
            }
        );
    }

    #[test]
    fn inspect_rejects_non_images_and_corrupt_bodies() {
        assert_matches!(inspect_upload(b"hello world"), Err(ImagingError::Decode(_)));
        // JPEG magic followed by junk.
        assert_matches!(
            inspect_upload(b"\xFF\xD8\xFFnot really a jpeg"),
            Err(ImagingError::Decode(_))
        );
        // Valid PNG header, truncated body.
        let png = png_bytes(&DynamicImage::ImageRgb8(gradient(32, 32)));
        assert!(inspect_upload(&png[..png.len() / 2]).is_err());
    }

    #[test]
    fn inspect_rejects_formats_without_a_decoder() {
        // BMP is recognised by its magic bytes but not compiled in.
        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&[0u8; 64]);
        assert!(inspect_upload(&bmp).is_err());
    }

    #[test]
    fn mime_types_from_extension() {
        assert_eq!(mime_type_for_path("thumbnails/thumb_a.jpg"), "image/jpeg");
        assert_eq!(mime_type_for_path("destinations/1/b.png"), "image/png");
        assert_eq!(mime_type_for_path("notes.txt"), "application/octet-stream");
    }
}
