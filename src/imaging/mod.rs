//! Image processing — pure Rust, in-memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, WebP, GIF) | `image::ImageReader::with_guessed_format` |
//! | **Resize** | `image::imageops::resize` with Lanczos3 |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//! | **Obfuscation noise** | custom block overlay ([`noise`]) |
//!
//! The module is split into:
//! - **Calculations**: pure functions for strip layout math (unit testable)
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Noise**: random semi-transparent block overlay
//! - **Compositor**: high-level strip assembly combining all of the above
//!
//! Unlike a build tool, nothing here touches the filesystem: thumbnails arrive
//! as HTTP bodies and leave as encoded JPEG buffers, so the codec seam works
//! on bytes and rasters rather than paths.

pub mod backend;
mod calculations;
pub mod compositor;
pub mod noise;
pub mod rust_backend;

pub use backend::{CodecError, ImageCodec};
pub use calculations::{scaled_width, strip_layout, Slot, StripLayout};
pub use compositor::{compose, CompositeSpec};
pub use noise::apply_noise;
pub use rust_backend::RustCodec;
