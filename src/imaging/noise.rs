//! Obfuscation noise: semi-transparent random blocks.
//!
//! Automated image classifiers fingerprint re-posted pictures byte- and
//! perceptual-hash-wise; a handful of small low-alpha blocks perturbs both
//! while staying invisible at chat-thumbnail size. The filter is
//! non-deterministic on purpose — every serve of the same picture gets a
//! fresh pattern — so the random source is a caller-injected [`Rng`], and
//! tests seed it instead of making production deterministic.

use image::RgbImage;
use rand::Rng;

/// Number of blocks per application, inclusive range.
const MIN_BLOCKS: u32 = 10;
const MAX_BLOCKS: u32 = 20;

/// Block edge length in pixels, inclusive range. Small enough not to bother
/// a human reader.
const MIN_BLOCK_EDGE: u32 = 3;
const MAX_BLOCK_EDGE: u32 = 8;

/// Block opacity out of 255, inclusive range.
const MIN_ALPHA: u16 = 30;
const MAX_ALPHA: u16 = 100;

/// Overlay random semi-transparent blocks on `img`, in place.
///
/// Each block picks a uniform top-left corner inside the image, a uniform
/// width and height in `[3, 8]`, a uniform RGB color, and a uniform alpha in
/// `[30, 100]`. The block is clamped to the image bounds — never written
/// outside them — and blended per channel with integer-truncating alpha
/// compositing:
///
/// ```text
/// new = (old * (255 - alpha) + chosen * alpha) / 255
/// ```
///
/// Never panics for any image; an empty raster is left untouched.
pub fn apply_noise<R: Rng + ?Sized>(img: &mut RgbImage, rng: &mut R) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let blocks = rng.gen_range(MIN_BLOCKS..=MAX_BLOCKS);
    for _ in 0..blocks {
        let x0 = rng.gen_range(0..width);
        let y0 = rng.gen_range(0..height);
        let block_w = rng.gen_range(MIN_BLOCK_EDGE..=MAX_BLOCK_EDGE);
        let block_h = rng.gen_range(MIN_BLOCK_EDGE..=MAX_BLOCK_EDGE);

        // Exclusive bottom-right, clamped to the raster. Saturating add keeps
        // the arithmetic in-bounds even for corners near u32::MAX-sized images.
        let x1 = x0.saturating_add(block_w).min(width);
        let y1 = y0.saturating_add(block_h).min(height);

        let color = [
            rng.gen_range(0..=255u16),
            rng.gen_range(0..=255u16),
            rng.gen_range(0..=255u16),
        ];
        let alpha = rng.gen_range(MIN_ALPHA..=MAX_ALPHA);

        for y in y0..y1 {
            for x in x0..x1 {
                let px = img.get_pixel_mut(x, y);
                for (channel, &chosen) in px.0.iter_mut().zip(color.iter()) {
                    let old = *channel as u16;
                    *channel = ((old * (255 - alpha) + chosen * alpha) / 255) as u8;
                }
            }
        }
    }
}
