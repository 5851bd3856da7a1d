//! Per-gallery TTL file cache.
//!
//! Fetching a gallery costs two upstream round-trips (metadata + cover), so
//! every successfully previewed gallery is written down: one JSON record and
//! one *clean* processed cover image per key, in a flat cache directory.
//! A repeat link within the TTL (default one day) is served entirely from
//! disk.
//!
//! # Design
//!
//! ## Keys
//!
//! The cache key is the upstream identifier pair flattened to
//! `"{gid}_{token}"` ([`GalleryId::cache_key`]). The pair is unique at the
//! source, so distinct galleries never collide.
//!
//! ## Freshness
//!
//! Each entry records its own `stored_at` timestamp, compared against an
//! injected [`Clock`]. This deliberately avoids file mtimes: tests backdate a
//! field instead of touching filesystem timestamps, and a cache directory
//! that gets copied or restored keeps honest ages.
//!
//! ## Serving
//!
//! A hit never returns the canonical files. The clean cover is re-read,
//! obfuscation noise is applied fresh (see
//! [`apply_noise`](crate::imaging::apply_noise)), and the result goes to a
//! scratch path per key. Repeated serves of one gallery therefore never share
//! a pixel-identical attachment, and a read never mutates the store. If the
//! re-noise or re-encode step fails, the hit is demoted to a miss — the clean
//! file is never handed out raw.
//!
//! ## Failure posture
//!
//! Anything wrong with an entry — torn write, corrupt JSON, missing image —
//! reads as a miss and triggers a live re-fetch. `store` overwrites wholesale
//! and is not atomic; a crash mid-write produces exactly such a torn entry.
//! Concurrent stores to one key are last-writer-wins; there is no locking.

use crate::imaging::{apply_noise, ImageCodec};
use crate::types::{GalleryId, GalleryRecord};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// JPEG quality for re-noised serves of a cached cover.
const SERVE_JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Time source for freshness checks.
pub trait Clock: Send + Sync {
    /// Current time as unix seconds.
    fn now_unix(&self) -> i64;
}

/// Wall-clock production implementation.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// On-disk entry wrapper: the record plus its own write timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    stored_at: i64,
    record: GalleryRecord,
}

#[derive(Serialize)]
struct StoredEntryRef<'a> {
    stored_at: i64,
    record: &'a GalleryRecord,
}

/// File-backed gallery store. See the [module docs](self).
pub struct GalleryCache {
    dir: PathBuf,
    scratch_dir: PathBuf,
    ttl: Duration,
    clock: Box<dyn Clock>,
}

impl GalleryCache {
    /// Open (and create if needed) a cache rooted at `dir`, writing re-noised
    /// serve copies under `scratch_dir`.
    pub fn new(dir: &Path, scratch_dir: &Path, ttl: Duration) -> Result<Self, CacheError> {
        Self::with_clock(dir, scratch_dir, ttl, Box::new(SystemClock))
    }

    /// Like [`GalleryCache::new`] with an explicit time source.
    pub fn with_clock(
        dir: &Path,
        scratch_dir: &Path,
        ttl: Duration,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir)?;
        std::fs::create_dir_all(scratch_dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            scratch_dir: scratch_dir.to_path_buf(),
            ttl,
            clock,
        })
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn image_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.jpg"))
    }

    fn scratch_path(&self, key: &str) -> PathBuf {
        self.scratch_dir.join(format!("{key}.serve.jpg"))
    }

    /// Write an entry, overwriting any prior one for the same gallery.
    ///
    /// `clean_jpeg` is the processed cover *before* noise — the stored artifact
    /// every future serve re-noises from.
    pub fn store(&self, record: &GalleryRecord, clean_jpeg: &[u8]) -> Result<(), CacheError> {
        let key = record.id.cache_key();
        let entry = StoredEntryRef {
            stored_at: self.clock.now_unix(),
            record,
        };
        let json = serde_json::to_string_pretty(&entry)?;
        std::fs::write(self.record_path(&key), json)?;
        std::fs::write(self.image_path(&key), clean_jpeg)?;
        debug!("cached gallery {key}");
        Ok(())
    }

    /// Fetch a fresh entry, re-noising the cover to a scratch file.
    ///
    /// Returns `None` for: no entry, torn/corrupt entry, entry older than the
    /// TTL, missing or undecodable cover, or a failed re-noise/re-encode. All
    /// of those mean "fetch live"; none of them is fatal.
    pub fn lookup<R: Rng + ?Sized>(
        &self,
        id: &GalleryId,
        codec: &impl ImageCodec,
        rng: &mut R,
    ) -> Option<(GalleryRecord, PathBuf)> {
        let key = id.cache_key();

        let text = std::fs::read_to_string(self.record_path(&key)).ok()?;
        let entry: StoredEntry = match serde_json::from_str(&text) {
            Ok(e) => e,
            Err(e) => {
                debug!("cache entry {key} is corrupt, treating as miss: {e}");
                return None;
            }
        };

        let age = self.clock.now_unix() - entry.stored_at;
        if age < 0 || age as u64 > self.ttl.as_secs() {
            debug!("cache entry {key} is stale (age {age}s), treating as miss");
            return None;
        }

        let clean = match std::fs::read(self.image_path(&key)) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("cached cover {key} unreadable, treating as miss: {e}");
                return None;
            }
        };
        let mut img = match codec.decode(&clean) {
            Ok(img) => img,
            Err(e) => {
                warn!("cached cover {key} failed to decode, treating as miss: {e}");
                return None;
            }
        };

        apply_noise(&mut img, rng);

        let served = match codec.encode_jpeg(&img, SERVE_JPEG_QUALITY) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("re-encoding cached cover {key} failed, treating as miss: {e}");
                return None;
            }
        };
        let scratch = self.scratch_path(&key);
        if let Err(e) = std::fs::write(&scratch, served) {
            warn!("writing serve copy for {key} failed, treating as miss: {e}");
            return None;
        }

        debug!("cache hit for {key}");
        Some((entry.record, scratch))
    }
}
