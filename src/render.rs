//! Reply text blocks.
//!
//! Everything user-visible is assembled here, away from pipeline control
//! flow, so wording changes never touch orchestration and tests can pin exact
//! strings. Two block shapes exist: the search listing (one entry per shown
//! hit, title plus reader link) and the gallery caption (one labeled line per
//! metadata field).

use crate::api::GalleryMetadata;
use crate::types::SearchHit;
use chrono::{TimeZone, Utc};

/// Hint for a search trigger with no keyword.
pub const HINT_SEARCH_USAGE: &str = "Give me a keyword to search for, e.g.: search team:alpha";

/// Reply when the archive returns zero hits.
pub const MSG_NO_RESULTS: &str = "No matches found.";

/// Generic search failure surfaced to the user; detail goes to the log.
pub const MSG_SEARCH_FAILED: &str = "Search failed, please try again later.";

/// Generic gallery-preview failure surfaced to the user; detail goes to the log.
pub const MSG_GALLERY_FAILED: &str = "Couldn't fetch that gallery link.";

/// Shown in place of a missing archive title.
const UNTITLED: &str = "(untitled)";

/// Reader link for one archive on the externally reachable server URL.
pub fn reader_url(external_url: &str, arcid: &str) -> String {
    format!("{}/reader?id={}", external_url.trim_end_matches('/'), arcid)
}

/// Text block listing the shown hits with their reader links.
///
/// `total` is the server's full hit count — the header reports it even though
/// at most five entries are rendered below.
pub fn search_listing(total: usize, shown: &[SearchHit], external_url: &str) -> String {
    let mut text = format!("Found {} result(s), showing {} at random:\n\n", total, shown.len());
    for hit in shown {
        let title = hit.title.as_deref().unwrap_or(UNTITLED);
        text.push_str(&format!("\u{1F4DA} {title}\n"));
        text.push_str(&format!(
            "\u{1F517} {}\n",
            reader_url(external_url, &hit.arcid)
        ));
        text.push_str("------------------------\n");
    }
    text
}

/// Caption block for one gallery: labeled metadata lines plus translated tags.
pub fn gallery_caption(meta: &GalleryMetadata, tags: &[String]) -> String {
    format!(
        "\u{1F4CC} Title: {}\n\
         \u{1F4D9} Original title: {}\n\
         \u{1F4C2} Category: {}\n\
         \u{1F464} Uploader: {}\n\
         \u{1F552} Posted: {}\n\
         \u{1F4C4} Pages: {}\n\
         \u{2B50} Rating: {}\n\
         \u{1F3F7}\u{FE0F} Tags: {}",
        meta.title,
        meta.title_jpn,
        meta.category,
        meta.uploader,
        posted_display(meta.posted),
        meta.pages,
        meta.rating,
        tags.join(", "),
    )
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM` UTC.
fn posted_display(posted: i64) -> String {
    match Utc.timestamp_opt(posted, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown".to_string(),
    }
}
