//! Thumbnail strip compositing.
//!
//! Takes the per-result thumbnails of one search reply and stitches them into
//! a single horizontal strip: every image is scaled proportionally to a common
//! height, placed left to right with fixed padding on a background canvas,
//! obfuscation noise is applied, and the whole canvas is encoded once as JPEG.

use super::backend::{CodecError, ImageCodec};
use super::calculations::strip_layout;
use super::noise::apply_noise;
use image::{Rgb, RgbImage};
use rand::Rng;

/// Parameters for one composite strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSpec {
    /// Uniform height every thumbnail is scaled to. Must be positive;
    /// [`crate::config::BotConfig::validate`] rejects zero.
    pub target_height: u32,
    /// Background pixels between neighboring images.
    pub padding: u32,
    /// Canvas fill color, visible in the padding gaps.
    pub background: [u8; 3],
    /// JPEG quality of the encoded strip (1-100).
    pub jpeg_quality: u8,
}

impl Default for CompositeSpec {
    fn default() -> Self {
        Self {
            target_height: 800,
            padding: 10,
            background: [255, 255, 255],
            jpeg_quality: 90,
        }
    }
}

/// Stitch decoded thumbnails into one encoded JPEG strip.
///
/// `images` holds one entry per search result, in result order; `None` marks a
/// thumbnail that failed to download or decode and is skipped. With no valid
/// image at all the function returns `Ok(None)` — the reply simply carries no
/// attachment, which is not an error.
///
/// The canvas is exactly `target_height` tall and `Σ scaled widths +
/// padding × (count − 1)` wide. Noise is applied to the finished canvas before
/// the single encode.
pub fn compose<R: Rng + ?Sized>(
    codec: &impl ImageCodec,
    images: &[Option<RgbImage>],
    spec: &CompositeSpec,
    rng: &mut R,
) -> Result<Option<Vec<u8>>, CodecError> {
    let valid: Vec<&RgbImage> = images.iter().flatten().collect();
    if valid.is_empty() {
        return Ok(None);
    }

    let sizes: Vec<(u32, u32)> = valid.iter().map(|img| img.dimensions()).collect();
    let layout = strip_layout(&sizes, spec.target_height, spec.padding);

    let mut canvas = RgbImage::from_pixel(
        layout.canvas_width,
        layout.canvas_height,
        Rgb(spec.background),
    );

    for (&img, slot) in valid.iter().zip(&layout.slots) {
        let scaled = codec.resize_exact(img, slot.width, spec.target_height);
        image::imageops::replace(&mut canvas, &scaled, slot.x_offset as i64, 0);
    }

    apply_noise(&mut canvas, rng);

    codec.encode_jpeg(&canvas, spec.jpeg_quality).map(Some)
}
