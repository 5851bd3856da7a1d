//! Namespace-keyed tag translation.
//!
//! Catalog tags arrive as `namespace:key` strings (`artist:foo`,
//! `language:japanese`). A static JSON dictionary maps namespaces to display
//! names and keys to display values; everything it doesn't know passes through
//! verbatim, so a stale dictionary degrades to partially-raw tags rather than
//! wrong ones.
//!
//! The dictionary file is the upstream translation database's shape:
//!
//! ```json
//! {
//!   "data": [
//!     {
//!       "namespace": "team",
//!       "frontMatters": { "name": "Team" },
//!       "data": { "foo": { "name": "Foo" } }
//!     }
//!   ]
//! }
//! ```
//!
//! Loading is an explicit parse-and-validate step that fails loudly on schema
//! mismatch. A broken dictionary aborts the request that needed it — serving
//! half-translated tags from a corrupt file would mislead readers.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed dictionary {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid dictionary {path}: {reason}")]
    Invalid { path: String, reason: String },
}

// On-disk shape. Field names follow the upstream file, not our conventions.
#[derive(Deserialize)]
struct RawFile {
    data: Vec<RawNamespace>,
}

#[derive(Deserialize)]
struct RawNamespace {
    namespace: String,
    #[serde(rename = "frontMatters")]
    front_matters: RawFrontMatters,
    #[serde(default)]
    data: HashMap<String, RawKey>,
}

#[derive(Deserialize)]
struct RawFrontMatters {
    name: String,
}

#[derive(Deserialize)]
struct RawKey {
    name: String,
}

#[derive(Debug, Clone)]
struct NamespaceEntry {
    display: String,
    keys: HashMap<String, String>,
}

/// Validated namespace → display-name / key-map lookup table.
///
/// Built once per load and read-only afterwards; the pipeline loads it at
/// startup and shares it across requests.
#[derive(Debug, Clone)]
pub struct TagDictionary {
    namespaces: HashMap<String, NamespaceEntry>,
}

impl TagDictionary {
    /// Load and validate the dictionary file.
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let text = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    /// Parse and validate dictionary JSON. `origin` labels error messages.
    pub fn from_json(json: &str, origin: &str) -> Result<Self, DictionaryError> {
        let raw: RawFile = serde_json::from_str(json).map_err(|source| DictionaryError::Parse {
            path: origin.to_string(),
            source,
        })?;

        let mut namespaces = HashMap::with_capacity(raw.data.len());
        for ns in raw.data {
            if ns.namespace.is_empty() {
                return Err(DictionaryError::Invalid {
                    path: origin.to_string(),
                    reason: "entry with empty namespace".to_string(),
                });
            }
            if ns.front_matters.name.is_empty() {
                return Err(DictionaryError::Invalid {
                    path: origin.to_string(),
                    reason: format!("namespace {:?} has an empty display name", ns.namespace),
                });
            }
            let keys = ns
                .data
                .into_iter()
                .map(|(key, value)| (key, value.name))
                .collect();
            namespaces.insert(
                ns.namespace,
                NamespaceEntry {
                    display: ns.front_matters.name,
                    keys,
                },
            );
        }

        Ok(Self { namespaces })
    }

    /// Translate tags, order-preserving, one output per input.
    pub fn translate(&self, raw_tags: &[String]) -> Vec<String> {
        raw_tags.iter().map(|tag| self.translate_one(tag)).collect()
    }

    /// Translate one `namespace:key` tag.
    ///
    /// The namespace token and (when mapped) the key token are each replaced
    /// textually, first occurrence only; anything the dictionary doesn't know
    /// is kept verbatim.
    fn translate_one(&self, raw: &str) -> String {
        let Some((namespace, key)) = raw.split_once(':') else {
            return raw.to_string();
        };
        let Some(entry) = self.namespaces.get(namespace) else {
            return raw.to_string();
        };

        let mut translated = raw.replacen(namespace, &entry.display, 1);
        if let Some(value) = entry.keys.get(key) {
            translated = translated.replacen(key, value, 1);
        }
        translated
    }
}
