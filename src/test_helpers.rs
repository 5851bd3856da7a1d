//! Shared test utilities for the shelfbot test suite.
//!
//! Provides synthetic image encoders, a canned translation dictionary, and
//! sample metadata/record values used across module tests.

use crate::api::GalleryMetadata;
use crate::types::{GalleryId, GalleryRecord};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};

/// Encode a small gradient JPEG with the given dimensions.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = test_image(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a small gradient PNG with the given dimensions.
pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = test_image(width, height);
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

fn test_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Dictionary JSON covering the namespaces the sample metadata uses.
pub fn dictionary_json() -> String {
    serde_json::json!({
        "data": [
            {
                "namespace": "team",
                "frontMatters": { "name": "Team" },
                "data": { "foo": { "name": "Foo" } }
            },
            {
                "namespace": "artist",
                "frontMatters": { "name": "Artist" },
                "data": { "foo": { "name": "Foo" } }
            },
            {
                "namespace": "language",
                "frontMatters": { "name": "Language" },
                "data": { "japanese": { "name": "Japanese" } }
            }
        ]
    })
    .to_string()
}

/// Write the canned dictionary into `dir` and return its path.
pub fn write_dictionary(dir: &Path) -> PathBuf {
    let path = dir.join("db.text.json");
    std::fs::write(&path, dictionary_json()).unwrap();
    path
}

/// Metadata as the catalog would report it for the sample gallery.
pub fn sample_metadata() -> GalleryMetadata {
    GalleryMetadata {
        title: "Sample Work".to_string(),
        title_jpn: "サンプル".to_string(),
        category: "Doujinshi".to_string(),
        uploader: "someone".to_string(),
        posted: 1_700_000_000,
        pages: 24,
        rating: "4.53".to_string(),
        tags: vec!["artist:foo".to_string(), "language:japanese".to_string()],
        thumb_url: "https://img.example/cover.jpg".to_string(),
    }
}

/// A fully-populated record for cache tests.
pub fn sample_record() -> GalleryRecord {
    GalleryRecord {
        id: GalleryId::new(2094541, "4b5a9e11ec"),
        title: "Sample Work".to_string(),
        title_jpn: "サンプル".to_string(),
        category: "Doujinshi".to_string(),
        uploader: "someone".to_string(),
        posted: 1_700_000_000,
        pages: 24,
        rating: "4.53".to_string(),
        raw_tags: vec!["artist:foo".to_string(), "language:japanese".to_string()],
        tags: vec!["Artist:Foo".to_string(), "Language:Japanese".to_string()],
        caption: "rendered caption".to_string(),
    }
}
