//! Bot configuration.
//!
//! Handles loading and validating `config.toml`. One flat file configures the
//! whole bot; every field has a default, so a config file only specifies what
//! it overrides. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [archive]
//! base_url = "http://127.0.0.1:3000/api"  # Archive server API root
//! # api_key = "secret"                    # Bearer token, omit if auth is off
//! external_url = "http://127.0.0.1:3000"  # Reachable URL for reader links
//!
//! [gallery]
//! api_url = "https://api.e-hentai.org/api.php"  # Catalog metadata endpoint
//! dictionary = "db.text.json"                   # Tag translation dictionary
//!
//! [cache]
//! dir = "cache"          # Gallery cache directory
//! ttl_secs = 86400       # Entry lifetime (1 day)
//! # scratch_dir = "/tmp" # Reply artifacts; system temp dir when omitted
//!
//! [compose]
//! target_height = 800    # Uniform thumbnail strip height in px
//! padding = 10           # Background gap between thumbnails in px
//! jpeg_quality = 90      # Strip/cover encoding quality (1-100)
//!
//! [http]
//! timeout_secs = 30      # Per-request timeout for both upstreams
//! ```

use crate::imaging::CompositeSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Bot configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    pub archive: ArchiveConfig,
    pub gallery: GalleryConfig,
    pub cache: CacheConfig,
    pub compose: ComposeConfig,
    pub http: HttpConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            archive: ArchiveConfig::default(),
            gallery: GalleryConfig::default(),
            cache: CacheConfig::default(),
            compose: ComposeConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Archive server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// API root of the archive server.
    pub base_url: String,
    /// Bearer token; `None` when the server runs without auth.
    pub api_key: Option<String>,
    /// Externally reachable server URL used to build reader links.
    pub external_url: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            api_key: None,
            external_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// External catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Catalog metadata endpoint.
    pub api_url: String,
    /// Tag translation dictionary file.
    pub dictionary: PathBuf,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_url: crate::api::DEFAULT_GALLERY_API_URL.to_string(),
            dictionary: PathBuf::from("db.text.json"),
        }
    }
}

/// Gallery cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
    /// Reply artifact directory; system temp dir when omitted.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            ttl_secs: 24 * 60 * 60,
            scratch_dir: None,
        }
    }
}

impl CacheConfig {
    /// Effective scratch directory.
    pub fn effective_scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("shelfbot"))
    }
}

/// Composite strip settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeConfig {
    pub target_height: u32,
    pub padding: u32,
    pub jpeg_quality: u8,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            target_height: 800,
            padding: 10,
            jpeg_quality: 90,
        }
    }
}

impl ComposeConfig {
    pub fn to_spec(&self) -> CompositeSpec {
        CompositeSpec {
            target_height: self.target_height,
            padding: self.padding,
            background: [255, 255, 255],
            jpeg_quality: self.jpeg_quality,
        }
    }
}

/// HTTP client settings shared by both upstreams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl BotConfig {
    /// Load from a config file, falling back to defaults when it doesn't
    /// exist. A present-but-broken file is an error, not a silent default.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archive.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "archive.base_url must not be empty".to_string(),
            ));
        }
        if self.archive.external_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "archive.external_url must not be empty".to_string(),
            ));
        }
        if self.compose.target_height == 0 {
            return Err(ConfigError::Validation(
                "compose.target_height must be positive".to_string(),
            ));
        }
        if self.compose.jpeg_quality == 0 || self.compose.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "compose.jpeg_quality must be in 1..=100".to_string(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "cache.ttl_secs must be positive".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stock `config.toml` with every option documented, for `gen-config`.
pub fn stock_config_toml() -> String {
    r#"# shelfbot configuration. Every option is optional; the values below are
# the defaults.

[archive]
# API root of the archive server.
base_url = "http://127.0.0.1:3000/api"
# Bearer token for the archive server. Omit when auth is disabled.
# api_key = "secret"
# Externally reachable server URL, used to build reader links in replies.
external_url = "http://127.0.0.1:3000"

[gallery]
# Catalog metadata endpoint.
api_url = "https://api.e-hentai.org/api.php"
# Tag translation dictionary file.
dictionary = "db.text.json"

[cache]
# Gallery cache directory: one JSON record and one cover image per gallery.
dir = "cache"
# Cache entry lifetime in seconds (default: one day).
ttl_secs = 86400
# Directory for per-reply image artifacts. System temp dir when omitted.
# scratch_dir = "/tmp/shelfbot"

[compose]
# Uniform height of the search thumbnail strip, in pixels.
target_height = 800
# Background gap between stitched thumbnails, in pixels.
padding = 10
# JPEG quality for emitted images (1-100).
jpeg_quality = 90

[http]
# Per-request timeout for both upstreams, in seconds.
timeout_secs = 30
"#
    .to_string()
}
