//! HTTP collaborators behind trait seams.
//!
//! Two upstreams exist: the self-hosted archive server (keyword search +
//! per-archive thumbnails, bearer-token auth) and the external catalog's
//! metadata API (gallery records by id/token pair + cover downloads). Both are
//! black boxes to the pipelines — [`ArchiveApi`] and [`GalleryApi`] are the
//! only surface the rest of the crate sees, and tests substitute recording
//! mocks.
//!
//! The production clients share one `ureq::Agent` with a 30 s request
//! timeout; a timed-out call surfaces as an [`ApiError`] like any other fetch
//! failure. No retries here — the pipelines decide per call site whether a
//! failure skips an item or aborts the request.

use crate::types::{GalleryId, SearchHit};
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// Default request timeout for both upstreams.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default catalog metadata endpoint.
pub const DEFAULT_GALLERY_API_URL: &str = "https://api.e-hentai.org/api.php";

/// Hard ceiling on downloaded image bodies. Thumbnails and covers are tens of
/// kilobytes; anything near this is a misbehaving server.
const MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("server returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ureq::Error> for ApiError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => ApiError::Status(code),
            ureq::Error::Transport(t) => ApiError::Transport(t.to_string()),
        }
    }
}

/// Keyword search and thumbnail access on the archive server.
pub trait ArchiveApi: Sync {
    /// Random-order keyword search. Returns the server's full hit list; the
    /// caller decides how many to render.
    fn search(&self, filter: &str) -> Result<Vec<SearchHit>, ApiError>;

    /// Thumbnail bytes for one archive. Format is whatever the server stores.
    fn thumbnail(&self, arcid: &str) -> Result<Vec<u8>, ApiError>;
}

/// Metadata and cover access on the external catalog.
pub trait GalleryApi: Sync {
    fn metadata(&self, id: &GalleryId) -> Result<GalleryMetadata, ApiError>;

    /// Cover bytes from the URL the metadata response named.
    fn cover(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

/// One gallery's metadata as the catalog reports it.
#[derive(Debug, Clone)]
pub struct GalleryMetadata {
    pub title: String,
    pub title_jpn: String,
    pub category: String,
    pub uploader: String,
    /// Upload time, unix seconds.
    pub posted: i64,
    pub pages: u32,
    /// Decimal string, e.g. `"4.53"`.
    pub rating: String,
    /// Raw `namespace:key` tags in catalog order.
    pub tags: Vec<String>,
    pub thumb_url: String,
}

/// Read a capped response body into memory.
fn read_body(resp: ureq::Response) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    resp.into_reader()
        .take(MAX_IMAGE_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Archive server client
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

/// `ureq` client for the archive server's JSON API.
pub struct LanraragiClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl LanraragiClient {
    /// `base_url` is the server's API root (e.g. `http://host:3000/api`);
    /// a trailing slash is tolerated. `api_key`, when present, is sent as a
    /// bearer token on every request.
    pub fn new(agent: ureq::Agent, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn get(&self, url: &str) -> ureq::Request {
        let req = self.agent.get(url);
        match &self.api_key {
            Some(key) => req.set("Authorization", &format!("Bearer {key}")),
            None => req,
        }
    }
}

impl ArchiveApi for LanraragiClient {
    fn search(&self, filter: &str) -> Result<Vec<SearchHit>, ApiError> {
        let url = format!("{}/search/random", self.base_url);
        let resp = self
            .get(&url)
            .query("filter", filter)
            .query("start", "20")
            .call()?;
        let body: SearchResponse = resp
            .into_json()
            .map_err(|e| ApiError::Malformed(e.to_string()))?;
        Ok(body.data)
    }

    fn thumbnail(&self, arcid: &str) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/archives/{}/thumbnail", self.base_url, arcid);
        read_body(self.get(&url).call()?)
    }
}

// ---------------------------------------------------------------------------
// Catalog metadata client
// ---------------------------------------------------------------------------

/// `ureq` client for the catalog's `gdata` JSON API.
pub struct CatalogClient {
    agent: ureq::Agent,
    api_url: String,
}

impl CatalogClient {
    pub fn new(agent: ureq::Agent, api_url: &str) -> Self {
        Self {
            agent,
            api_url: api_url.to_string(),
        }
    }
}

impl GalleryApi for CatalogClient {
    fn metadata(&self, id: &GalleryId) -> Result<GalleryMetadata, ApiError> {
        let payload = serde_json::json!({
            "method": "gdata",
            "gidlist": [[id.gid, id.token]],
            "namespace": 1,
        });
        let resp = self.agent.post(&self.api_url).send_json(payload)?;
        let body: serde_json::Value = resp
            .into_json()
            .map_err(|e| ApiError::Malformed(e.to_string()))?;
        parse_gmetadata(&body)
    }

    fn cover(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        read_body(self.agent.get(url).call()?)
    }
}

/// Entry shape inside a successful `gdata` response. Numeric-looking fields
/// arrive as strings; they are parsed here, once, so the rest of the crate
/// never sees the quirk.
#[derive(Deserialize)]
struct RawGalleryEntry {
    title: String,
    #[serde(default)]
    title_jpn: String,
    category: String,
    uploader: String,
    posted: String,
    filecount: String,
    rating: String,
    #[serde(default)]
    tags: Vec<String>,
    thumb: String,
}

/// Extract the single requested gallery from a `gdata` response body.
///
/// The API signals per-entry failures in-band: a bad id/token pair yields
/// `{"gmetadata": [{"gid": ..., "error": "..."}]}` with HTTP 200, so the error
/// key has to be checked before the entry is deserialized.
fn parse_gmetadata(body: &serde_json::Value) -> Result<GalleryMetadata, ApiError> {
    let entry = body
        .get("gmetadata")
        .and_then(|g| g.get(0))
        .ok_or_else(|| ApiError::Malformed("no gmetadata entry".to_string()))?;

    if let Some(error) = entry.get("error").and_then(|e| e.as_str()) {
        return Err(ApiError::Malformed(format!("catalog error: {error}")));
    }

    let raw: RawGalleryEntry = serde_json::from_value(entry.clone())
        .map_err(|e| ApiError::Malformed(e.to_string()))?;

    let posted = raw
        .posted
        .parse::<f64>()
        .map_err(|_| ApiError::Malformed(format!("bad posted timestamp {:?}", raw.posted)))?
        as i64;
    let pages = raw
        .filecount
        .parse::<u32>()
        .map_err(|_| ApiError::Malformed(format!("bad page count {:?}", raw.filecount)))?;

    Ok(GalleryMetadata {
        title: raw.title,
        title_jpn: raw.title_jpn,
        category: raw.category,
        uploader: raw.uploader,
        posted,
        pages,
        rating: raw.rating,
        tags: raw.tags,
        thumb_url: raw.thumb,
    })
}
