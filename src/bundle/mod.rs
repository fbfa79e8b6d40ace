//! Change detection for image bundles.
//!
//! A bundle is a directory holding images plus one descriptor file whose
//! `lastmod` header field is kept up to date.
//!
//! # Pipeline
//!
//! ```text
//! scan::scan_bundle() ──► diff::diff() ──► policy::decide() ──► descriptor::render()
//!        │                    ▲                                       │
//!        ▼                    │                                       ▼
//!    Inventory ───────► FingerprintCache ◄─────────── put() ──── index.md
//! ```

pub mod cache;
pub mod descriptor;
pub mod diff;
mod error;
pub mod policy;
pub mod scan;

pub use error::{BundleError, CacheError, DescriptorError, ScanError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How files are fingerprinted and how `lastmod` is derived.
///
/// Fixed for a whole run; the cache remembers it so that switching
/// strategies starts from an empty baseline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Modification time; `lastmod` becomes the newest image mtime.
    #[default]
    Mtime,
    /// BLAKE3 content hash; `lastmod` becomes "now" whenever the set changed.
    Hash,
}

impl Strategy {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mtime => "mtime",
            Self::Hash => "hash",
        }
    }
}

/// Change-detection value of a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fingerprint {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "mtime")]
    Mtime(i64),
    /// Lowercase hex BLAKE3 digest.
    #[serde(rename = "hash")]
    Hash(String),
}

/// One image file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    #[serde(flatten)]
    pub fingerprint: Fingerprint,
    pub size: u64,
}

impl ImageEntry {
    pub const fn mtime(mtime_ms: i64, size: u64) -> Self {
        Self {
            fingerprint: Fingerprint::Mtime(mtime_ms),
            size,
        }
    }

    pub fn hash(hash: impl Into<String>, size: u64) -> Self {
        Self {
            fingerprint: Fingerprint::Hash(hash.into()),
            size,
        }
    }

    /// Modification time, if this entry was fingerprinted by mtime.
    pub const fn mtime_ms(&self) -> Option<i64> {
        match self.fingerprint {
            Fingerprint::Mtime(ms) => Some(ms),
            Fingerprint::Hash(_) => None,
        }
    }
}

/// All images of a bundle, keyed by `/`-separated path relative to the bundle.
pub type Inventory = BTreeMap<String, ImageEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_entry_json_shape_mtime() {
        let entry = ImageEntry::mtime(1_700_000_000_000, 42);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"mtime": 1_700_000_000_000_i64, "size": 42}));
    }

    #[test]
    fn test_image_entry_json_shape_hash() {
        let json = serde_json::json!({"hash": "abc123", "size": 7});
        let entry: ImageEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry, ImageEntry::hash("abc123", 7));
        assert_eq!(entry.mtime_ms(), None);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Mtime.name(), "mtime");
        assert_eq!(Strategy::Hash.name(), "hash");
        assert_eq!(
            serde_json::to_string(&Strategy::Hash).unwrap(),
            "\"hash\""
        );
    }
}
