//! Image codec trait and shared error type.
//!
//! The [`ImageCodec`] trait defines the three primitives every codec must
//! support: decode bytes, resize to exact dimensions, and encode to JPEG.
//!
//! The production implementation is [`RustCodec`](super::rust_backend::RustCodec)
//! — pure Rust via the `image` crate. Everything is statically linked into the
//! binary.

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Trait for image codecs.
///
/// Every codec must implement all three operations — decode, resize, and
/// encode — so the compositor and cache are codec-agnostic. Resampling quality
/// is part of the contract: `resize_exact` must use a high-quality filter
/// (Lanczos-class), since thumbnails shrink and grow by arbitrary ratios.
pub trait ImageCodec: Sync {
    /// Decode an image from raw bytes, converting to RGB8.
    fn decode(&self, bytes: &[u8]) -> Result<RgbImage, CodecError>;

    /// Resize to exactly `width` × `height`, ignoring the source aspect ratio.
    fn resize_exact(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage;

    /// Encode as JPEG at the given quality (1–100).
    fn encode_jpeg(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError>;
}
