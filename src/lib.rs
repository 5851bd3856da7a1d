//! # Shelfbot
//!
//! Chat-bot core for a self-hosted archive server. Two request shapes come in,
//! one reply payload goes out:
//!
//! ```text
//! 1. Search    keyword      →  composite thumbnail strip + captioned reader links
//! 2. Preview   gallery link →  captioned cover image (cached for a day)
//! ```
//!
//! # Architecture: Two Linear Pipelines
//!
//! Each request is processed end-to-end by one pipeline call over an explicit
//! [`pipeline::BotContext`] — clients, codec, and cache are built once at
//! startup and passed in, never reached through globals.
//!
//! ```text
//! search:   ArchiveApi.search → fetch ≤5 thumbnails → compose strip → Reply
//! preview:  link match → cache lookup | GalleryApi.metadata + cover
//!                      → translate tags → cache store → Reply
//! ```
//!
//! Failures degrade by scope: a thumbnail that won't fetch or decode is
//! skipped, a gallery metadata fetch that fails aborts that one request with a
//! plain-text reply, and nothing panics the process.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Request orchestration — search and gallery-link flows, `Reply` assembly |
//! | [`api`] | Collaborator seams: `ArchiveApi` / `GalleryApi` traits + `ureq` clients |
//! | [`imaging`] | Thumbnail strip compositing, obfuscation noise, codec trait + `image`-crate backend |
//! | [`cache`] | Per-gallery TTL file cache: one JSON record + one clean cover image per key |
//! | [`translate`] | Namespace-keyed tag translation from a static JSON dictionary |
//! | [`render`] | Reply text blocks — search listings and gallery captions |
//! | [`config`] | `config.toml` loading, validation, stock config generation |
//! | [`types`] | Shared serialized types (`GalleryId`, `GalleryRecord`, `SearchHit`) |
//!
//! # Design Decisions
//!
//! ## Traits at the I/O Seams
//!
//! HTTP and pixel work sit behind traits ([`api::ArchiveApi`],
//! [`api::GalleryApi`], [`imaging::ImageCodec`], [`cache::Clock`]) with the
//! production implementations next to them. Pipeline and cache logic is
//! exercised in tests against recording mocks — no network, no wall clock.
//!
//! ## Noise Is Re-Applied on Every Serve
//!
//! The cache stores the *clean* processed cover. Every serve — fresh fetch or
//! cache hit — runs the obfuscation filter again, so repeated posts of the
//! same gallery never share a static pixel fingerprint. A hit whose re-noise
//! step fails is demoted to a miss; the clean file is never handed out.
//!
//! ## TTL from a Stored Timestamp, Not mtime
//!
//! Each cache entry records its own write time, compared against an injected
//! [`cache::Clock`]. Tests backdate the field instead of touching file
//! timestamps, and a copied or restored cache directory keeps honest ages.
//!
//! ## One In-Flight Request
//!
//! There is no request queue and no shared mutable state beyond the cache
//! directory (last-writer-wins per key). The only parallelism is the bounded
//! rayon fan-out over at most five thumbnail downloads inside one search.

pub mod api;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod pipeline;
pub mod render;
pub mod translate;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
