//! Request orchestration.
//!
//! Two entry points, one per request shape:
//!
//! - [`run_search`] — keyword search: fetch hits, download at most five
//!   thumbnails in parallel, composite them into a strip, list titles and
//!   reader links.
//! - [`run_gallery_link`] — gallery preview: detect a catalog link in the
//!   message, serve from the cache when fresh, otherwise fetch metadata and
//!   cover, translate tags, store, reply with a noised cover plus caption.
//!
//! Both always terminate in a [`Reply`] (or `None` when the message simply
//! isn't ours): every failure either skips one item or ends the request with
//! a single user-facing message. There are no retries and no panics.
//!
//! Failure scope, per collaborator:
//!
//! | Failure | Scope |
//! |---|---|
//! | empty keyword | usage hint reply |
//! | archive search | request ends with a failure reply |
//! | one thumbnail fetch/decode | that item is skipped |
//! | strip compositing | reply degrades to text-only |
//! | gallery metadata / cover fetch | request ends with a failure reply |
//! | tag dictionary load | request ends with a failure reply |
//! | cover decode | reply degrades to caption-only, nothing cached |
//! | cache read | treated as a miss, live fetch |
//! | cache write | logged, reply still delivered |

use crate::api::{ArchiveApi, GalleryApi};
use crate::cache::GalleryCache;
use crate::imaging::{apply_noise, compose, CompositeSpec, ImageCodec};
use crate::render;
use crate::translate::TagDictionary;
use crate::types::{GalleryId, GalleryRecord, SearchHit};
use image::RgbImage;
use log::{error, warn};
use rand::thread_rng;
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// At most this many search hits get thumbnails and listing entries.
pub const MAX_RESULTS: usize = 5;

/// Catalog gallery URL: numeric id plus 10-hex-digit token.
static GALLERY_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://e[-x]hentai\.org/g/(\d+)/([0-9a-f]{10})").unwrap()
});

/// One piece of an outgoing reply, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySegment {
    /// Path to a scratch image file for the messaging collaborator to attach.
    Image(PathBuf),
    Text(String),
}

/// Ordered payload handed to the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub segments: Vec<ReplySegment>,
}

impl Reply {
    fn text(msg: impl Into<String>) -> Self {
        Self {
            segments: vec![ReplySegment::Text(msg.into())],
        }
    }
}

/// Everything one request needs, built once at startup and passed by
/// reference — clients, codec, cache, and paths live here instead of in
/// globals, and dropping the context releases the lot.
pub struct BotContext<A: ArchiveApi, G: GalleryApi, C: ImageCodec> {
    pub archive: A,
    pub gallery: G,
    pub codec: C,
    pub cache: GalleryCache,
    /// Translation dictionary file, loaded per gallery request so a broken
    /// file fails that request, not startup.
    pub dictionary_path: PathBuf,
    /// Externally reachable archive URL for reader links.
    pub external_url: String,
    pub spec: CompositeSpec,
    /// Where per-reply image artifacts are written.
    pub scratch_dir: PathBuf,
}

/// Find the first catalog gallery link in a message.
pub fn detect_gallery_link(message: &str) -> Option<GalleryId> {
    let caps = GALLERY_LINK.captures(message)?;
    let gid = caps[1].parse::<u64>().ok()?;
    Some(GalleryId::new(gid, &caps[2]))
}

/// Keyword search → composite strip + listing.
pub fn run_search<A, G, C>(ctx: &BotContext<A, G, C>, keyword: &str) -> Reply
where
    A: ArchiveApi,
    G: GalleryApi,
    C: ImageCodec,
{
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Reply::text(render::HINT_SEARCH_USAGE);
    }

    let hits = match ctx.archive.search(keyword) {
        Ok(hits) => hits,
        Err(e) => {
            error!("archive search for {keyword:?} failed: {e}");
            return Reply::text(render::MSG_SEARCH_FAILED);
        }
    };
    if hits.is_empty() {
        return Reply::text(render::MSG_NO_RESULTS);
    }

    let shown = &hits[..hits.len().min(MAX_RESULTS)];
    let thumbnails = fetch_thumbnails(ctx, shown);

    let mut segments = Vec::new();
    match compose(&ctx.codec, &thumbnails, &ctx.spec, &mut thread_rng()) {
        Ok(Some(bytes)) => {
            match write_scratch(&ctx.scratch_dir, "search-strip.jpg", &bytes) {
                Ok(path) => segments.push(ReplySegment::Image(path)),
                Err(e) => warn!("writing composite strip failed: {e}"),
            }
        }
        Ok(None) => {} // every thumbnail failed; listing alone still goes out
        Err(e) => warn!("compositing failed, sending text-only reply: {e}"),
    }

    segments.push(ReplySegment::Text(render::search_listing(
        hits.len(),
        shown,
        &ctx.external_url,
    )));
    Reply { segments }
}

/// Download and decode thumbnails for the shown hits, in parallel, one slot
/// per hit. A failed fetch or decode leaves `None` in that slot.
fn fetch_thumbnails<A, G, C>(ctx: &BotContext<A, G, C>, shown: &[SearchHit]) -> Vec<Option<RgbImage>>
where
    A: ArchiveApi,
    G: GalleryApi,
    C: ImageCodec,
{
    shown
        .par_iter()
        .map(|hit| {
            let bytes = match ctx.archive.thumbnail(&hit.arcid) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("thumbnail fetch for {} failed, skipping: {e}", hit.arcid);
                    return None;
                }
            };
            match ctx.codec.decode(&bytes) {
                Ok(img) => Some(img),
                Err(e) => {
                    warn!("thumbnail for {} failed to decode, skipping: {e}", hit.arcid);
                    None
                }
            }
        })
        .collect()
}

/// Gallery-link preview. Returns `None` when the message contains no catalog
/// link — the message wasn't addressed to us.
pub fn run_gallery_link<A, G, C>(ctx: &BotContext<A, G, C>, message: &str) -> Option<Reply>
where
    A: ArchiveApi,
    G: GalleryApi,
    C: ImageCodec,
{
    let id = detect_gallery_link(message)?;
    Some(preview_gallery(ctx, id))
}

fn preview_gallery<A, G, C>(ctx: &BotContext<A, G, C>, id: GalleryId) -> Reply
where
    A: ArchiveApi,
    G: GalleryApi,
    C: ImageCodec,
{
    let mut rng = thread_rng();

    if let Some((record, served)) = ctx.cache.lookup(&id, &ctx.codec, &mut rng) {
        return Reply {
            segments: vec![
                ReplySegment::Image(served),
                ReplySegment::Text(record.caption),
            ],
        };
    }

    let meta = match ctx.gallery.metadata(&id) {
        Ok(meta) => meta,
        Err(e) => {
            error!("metadata fetch for gallery {id} failed: {e}");
            return Reply::text(render::MSG_GALLERY_FAILED);
        }
    };

    let dictionary = match TagDictionary::load(&ctx.dictionary_path) {
        Ok(dict) => dict,
        Err(e) => {
            // A broken dictionary would produce misleading half-translated
            // tags, so the whole request fails instead.
            error!("tag dictionary unavailable: {e}");
            return Reply::text(render::MSG_GALLERY_FAILED);
        }
    };
    let tags = dictionary.translate(&meta.tags);

    let cover_bytes = match ctx.gallery.cover(&meta.thumb_url) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("cover fetch for gallery {id} failed: {e}");
            return Reply::text(render::MSG_GALLERY_FAILED);
        }
    };

    let caption = render::gallery_caption(&meta, &tags);
    let record = GalleryRecord {
        id: id.clone(),
        title: meta.title,
        title_jpn: meta.title_jpn,
        category: meta.category,
        uploader: meta.uploader,
        posted: meta.posted,
        pages: meta.pages,
        rating: meta.rating,
        raw_tags: meta.tags,
        tags,
        caption,
    };

    let mut segments = Vec::new();
    match ctx.codec.decode(&cover_bytes) {
        Ok(clean) => {
            // Cache the clean cover; every serve re-noises from it.
            match ctx.codec.encode_jpeg(&clean, ctx.spec.jpeg_quality) {
                Ok(clean_jpeg) => {
                    if let Err(e) = ctx.cache.store(&record, &clean_jpeg) {
                        warn!("caching gallery {id} failed: {e}");
                    }
                }
                Err(e) => warn!("encoding clean cover for {id} failed, not cached: {e}"),
            }

            let mut served = clean;
            apply_noise(&mut served, &mut rng);
            match ctx.codec.encode_jpeg(&served, ctx.spec.jpeg_quality) {
                Ok(bytes) => match write_scratch(&ctx.scratch_dir, "gallery-cover.jpg", &bytes) {
                    Ok(path) => segments.push(ReplySegment::Image(path)),
                    Err(e) => warn!("writing cover for {id} failed: {e}"),
                },
                Err(e) => warn!("encoding served cover for {id} failed: {e}"),
            }
        }
        Err(e) => {
            // Caption still goes out; nothing worth caching without a cover.
            warn!("cover for gallery {id} failed to decode, caption only: {e}");
        }
    }

    segments.push(ReplySegment::Text(record.caption));
    Reply { segments }
}

fn write_scratch(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{MockArchive, MockGallery};
    use crate::cache::{GalleryCache, DEFAULT_TTL};
    use crate::imaging::RustCodec;
    use crate::test_helpers::{encode_test_jpeg, sample_metadata, write_dictionary};
    use tempfile::TempDir;

    fn context(
        tmp: &TempDir,
        archive: MockArchive,
        gallery: MockGallery,
    ) -> BotContext<MockArchive, MockGallery, RustCodec> {
        BotContext {
            archive,
            gallery,
            codec: RustCodec::new(),
            cache: GalleryCache::new(
                &tmp.path().join("cache"),
                &tmp.path().join("scratch"),
                DEFAULT_TTL,
            )
            .unwrap(),
            dictionary_path: write_dictionary(tmp.path()),
            external_url: "http://reader.example".to_string(),
            spec: CompositeSpec {
                target_height: 64,
                ..CompositeSpec::default()
            },
            scratch_dir: tmp.path().join("scratch"),
        }
    }

    fn hit(arcid: &str) -> SearchHit {
        SearchHit {
            arcid: arcid.to_string(),
            title: Some(format!("Title {arcid}")),
        }
    }

    fn texts(reply: &Reply) -> Vec<&str> {
        reply
            .segments
            .iter()
            .filter_map(|s| match s {
                ReplySegment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn image_path(reply: &Reply) -> Option<&PathBuf> {
        reply.segments.iter().find_map(|s| match s {
            ReplySegment::Image(p) => Some(p),
            _ => None,
        })
    }

    // =========================================================================
    // Link detection
    // =========================================================================

    #[test]
    fn detects_gallery_link_in_surrounding_text() {
        let id =
            detect_gallery_link("look at https://e-hentai.org/g/2094541/4b5a9e11ec nice right?")
                .unwrap();
        assert_eq!(id, GalleryId::new(2094541, "4b5a9e11ec"));
    }

    #[test]
    fn detects_both_site_variants() {
        assert!(detect_gallery_link("https://e-hentai.org/g/1/0123456789").is_some());
        assert!(detect_gallery_link("https://exhentai.org/g/1/0123456789").is_some());
    }

    #[test]
    fn rejects_short_token_and_plain_text() {
        assert!(detect_gallery_link("https://e-hentai.org/g/1/0123").is_none());
        assert!(detect_gallery_link("no links here").is_none());
    }

    // =========================================================================
    // Search pipeline
    // =========================================================================

    #[test]
    fn empty_keyword_yields_usage_hint() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), MockGallery::default());

        let reply = run_search(&ctx, "   ");
        assert_eq!(texts(&reply), vec![render::HINT_SEARCH_USAGE]);
        assert!(ctx.archive.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn search_failure_yields_failure_message() {
        let tmp = TempDir::new().unwrap();
        let archive = MockArchive {
            search_fails: true,
            ..MockArchive::default()
        };
        let ctx = context(&tmp, archive, MockGallery::default());

        let reply = run_search(&ctx, "keyword");
        assert_eq!(texts(&reply), vec![render::MSG_SEARCH_FAILED]);
    }

    #[test]
    fn no_hits_yields_no_results_message() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), MockGallery::default());

        let reply = run_search(&ctx, "obscure");
        assert_eq!(texts(&reply), vec![render::MSG_NO_RESULTS]);
    }

    #[test]
    fn seven_hits_cap_at_five_processed() {
        let tmp = TempDir::new().unwrap();
        let jpeg = encode_test_jpeg(48, 64);
        let mut archive = MockArchive::default();
        for i in 0..7 {
            let arcid = format!("arc{i}");
            archive.hits.push(hit(&arcid));
            archive.thumbs.insert(arcid, jpeg.clone());
        }
        let ctx = context(&tmp, archive, MockGallery::default());

        let reply = run_search(&ctx, "popular");

        let calls = ctx.archive.calls.lock().unwrap();
        let thumb_calls = calls.iter().filter(|c| c.starts_with("thumb:")).count();
        assert_eq!(thumb_calls, 5);

        // Listing shows five entries but reports all seven hits.
        let listing = texts(&reply)[0];
        assert!(listing.starts_with("Found 7 result(s), showing 5 at random:"));
        assert_eq!(listing.matches("\u{1F4DA}").count(), 5);
        assert!(listing.contains("http://reader.example/reader?id=arc0"));
    }

    #[test]
    fn composite_strip_width_tracks_decoded_thumbnails() {
        let tmp = TempDir::new().unwrap();
        let mut archive = MockArchive::default();
        // Three hits: two decodable 48x64 thumbnails, one garbage body.
        archive.hits = vec![hit("a"), hit("b"), hit("c")];
        archive.thumbs.insert("a".into(), encode_test_jpeg(48, 64));
        archive.thumbs.insert("b".into(), b"not an image".to_vec());
        archive.thumbs.insert("c".into(), encode_test_jpeg(48, 64));
        let ctx = context(&tmp, archive, MockGallery::default());

        let reply = run_search(&ctx, "mixed");

        // Two valid 48x64 thumbs at target height 64 → widths 48 + 48,
        // plus one 10px gap → 106x64 strip.
        let strip = ctx
            .codec
            .decode(&std::fs::read(image_path(&reply).unwrap()).unwrap())
            .unwrap();
        assert_eq!(strip.dimensions(), (106, 64));
    }

    #[test]
    fn per_item_fetch_failures_skip_but_listing_remains_complete() {
        let tmp = TempDir::new().unwrap();
        let mut archive = MockArchive::default();
        archive.hits = vec![hit("a"), hit("b")];
        // Only "a" has thumbnail bytes; "b"'s fetch 404s.
        archive.thumbs.insert("a".into(), encode_test_jpeg(48, 64));
        let ctx = context(&tmp, archive, MockGallery::default());

        let reply = run_search(&ctx, "partial");

        let strip = ctx
            .codec
            .decode(&std::fs::read(image_path(&reply).unwrap()).unwrap())
            .unwrap();
        assert_eq!(strip.dimensions(), (48, 64));

        // Both hits are still listed.
        let listing = texts(&reply)[0];
        assert_eq!(listing.matches("\u{1F4DA}").count(), 2);
    }

    #[test]
    fn all_thumbnails_failing_gives_text_only_reply() {
        let tmp = TempDir::new().unwrap();
        let mut archive = MockArchive::default();
        archive.hits = vec![hit("a"), hit("b")];
        let ctx = context(&tmp, archive, MockGallery::default());

        let reply = run_search(&ctx, "unfetchable");
        assert!(image_path(&reply).is_none());
        assert_eq!(reply.segments.len(), 1);
    }

    // =========================================================================
    // Gallery-link pipeline
    // =========================================================================

    const LINK: &str = "https://e-hentai.org/g/2094541/4b5a9e11ec";

    fn stocked_gallery() -> MockGallery {
        MockGallery {
            meta: Some(sample_metadata()),
            cover_bytes: Some(encode_test_jpeg(60, 90)),
            calls: Default::default(),
        }
    }

    #[test]
    fn message_without_link_is_not_ours() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), MockGallery::default());
        assert!(run_gallery_link(&ctx, "just chatting").is_none());
    }

    #[test]
    fn fresh_gallery_fetch_replies_with_cover_and_caption() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), stocked_gallery());

        let reply = run_gallery_link(&ctx, LINK).unwrap();

        assert!(image_path(&reply).is_some());
        let caption = texts(&reply)[0];
        assert!(caption.contains("Title: Sample Work"));
        // Dictionary maps artist→Artist and foo→Foo (see test_helpers).
        assert!(caption.contains("Artist:Foo"));
    }

    #[test]
    fn fresh_fetch_stores_cache_entry() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), stocked_gallery());

        run_gallery_link(&ctx, LINK).unwrap();

        let cache_dir = tmp.path().join("cache");
        assert!(cache_dir.join("2094541_4b5a9e11ec.json").exists());
        assert!(cache_dir.join("2094541_4b5a9e11ec.jpg").exists());
    }

    #[test]
    fn second_request_is_served_from_cache() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), stocked_gallery());

        let first = run_gallery_link(&ctx, LINK).unwrap();
        let second = run_gallery_link(&ctx, LINK).unwrap();

        // Upstream touched exactly once.
        let calls = ctx.gallery.calls.lock().unwrap();
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("metadata:")).count(),
            1
        );

        // Same caption, fresh noise on the served image.
        assert_eq!(texts(&first), texts(&second));
        let first_bytes = std::fs::read(image_path(&first).unwrap()).unwrap();
        let second_bytes = std::fs::read(image_path(&second).unwrap()).unwrap();
        assert_ne!(first_bytes, second_bytes);
    }

    #[test]
    fn metadata_failure_aborts_with_generic_message() {
        let tmp = TempDir::new().unwrap();
        let gallery = MockGallery {
            meta: None,
            cover_bytes: Some(encode_test_jpeg(60, 90)),
            calls: Default::default(),
        };
        let ctx = context(&tmp, MockArchive::default(), gallery);

        let reply = run_gallery_link(&ctx, LINK).unwrap();
        assert_eq!(texts(&reply), vec![render::MSG_GALLERY_FAILED]);
    }

    #[test]
    fn cover_fetch_failure_aborts_with_generic_message() {
        let tmp = TempDir::new().unwrap();
        let gallery = MockGallery {
            meta: Some(sample_metadata()),
            cover_bytes: None,
            calls: Default::default(),
        };
        let ctx = context(&tmp, MockArchive::default(), gallery);

        let reply = run_gallery_link(&ctx, LINK).unwrap();
        assert_eq!(texts(&reply), vec![render::MSG_GALLERY_FAILED]);
    }

    #[test]
    fn missing_dictionary_aborts_the_request() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(&tmp, MockArchive::default(), stocked_gallery());
        ctx.dictionary_path = tmp.path().join("gone.json");

        let reply = run_gallery_link(&ctx, LINK).unwrap();
        assert_eq!(texts(&reply), vec![render::MSG_GALLERY_FAILED]);
    }

    #[test]
    fn undecodable_cover_degrades_to_caption_only() {
        let tmp = TempDir::new().unwrap();
        let gallery = MockGallery {
            meta: Some(sample_metadata()),
            cover_bytes: Some(b"jpeg? never heard of it".to_vec()),
            calls: Default::default(),
        };
        let ctx = context(&tmp, MockArchive::default(), gallery);

        let reply = run_gallery_link(&ctx, LINK).unwrap();
        assert!(image_path(&reply).is_none());
        assert!(texts(&reply)[0].contains("Title: Sample Work"));

        // Nothing cached without a usable cover.
        assert!(!tmp
            .path()
            .join("cache")
            .join("2094541_4b5a9e11ec.json")
            .exists());
    }

    #[test]
    fn served_cover_is_noised_not_byte_identical_to_clean() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp, MockArchive::default(), stocked_gallery());

        let reply = run_gallery_link(&ctx, LINK).unwrap();

        let served = std::fs::read(image_path(&reply).unwrap()).unwrap();
        let clean = std::fs::read(tmp.path().join("cache").join("2094541_4b5a9e11ec.jpg")).unwrap();
        assert_ne!(served, clean);
    }
}
