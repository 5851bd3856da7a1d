//! Shared types used across the request pipelines.
//!
//! `GalleryRecord` is serialized to JSON inside cache entries, so its shape is
//! the cache's on-disk contract as well as the in-memory one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one gallery on the external catalog site.
///
/// The catalog addresses every gallery by a numeric id plus a short hex token;
/// the pair is unique upstream, so it doubles as our cache key (see
/// [`GalleryId::cache_key`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GalleryId {
    pub gid: u64,
    pub token: String,
}

impl GalleryId {
    pub fn new(gid: u64, token: impl Into<String>) -> Self {
        Self {
            gid,
            token: token.into(),
        }
    }

    /// Flat key used for cache file names: `"{gid}_{token}"`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.gid, self.token)
    }
}

impl fmt::Display for GalleryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.gid, self.token)
    }
}

/// One result from an archive keyword search.
///
/// The thumbnail URL is not stored here — it is derived from `arcid` by the
/// archive client, so a hit stays valid if the server moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub arcid: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Everything we keep about one catalog gallery.
///
/// `raw_tags` and `tags` are positionally aligned: `tags[i]` is the translated
/// form of `raw_tags[i]`, or the raw tag verbatim where no translation exists.
/// `caption` is the fully rendered reply text, stored so cache hits skip both
/// translation and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryRecord {
    pub id: GalleryId,
    pub title: String,
    /// Title in the work's original language, empty when the catalog has none.
    pub title_jpn: String,
    pub category: String,
    pub uploader: String,
    /// Upload time, unix seconds.
    pub posted: i64,
    pub pages: u32,
    /// Kept as the catalog's decimal string — display-only, never computed on.
    pub rating: String,
    pub raw_tags: Vec<String>,
    pub tags: Vec<String>,
    pub caption: String,
}
