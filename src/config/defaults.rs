//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

use crate::bundle::Strategy;
use std::path::PathBuf;

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// Bundle Discovery Defaults
// ============================================================================

pub fn target_dirs() -> Vec<String> {
    vec!["content/galleries/*".into(), "content/stories/*".into()]
}

pub fn extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "avif", "heic", "tif", "tiff"]
        .into_iter()
        .map(Into::into)
        .collect()
}

pub fn max_depth() -> usize {
    2
}

// ============================================================================
// Descriptor Defaults
// ============================================================================

pub fn frontmatter_delim() -> String {
    "---".into()
}

pub fn index_file() -> String {
    "index.md".into()
}

// ============================================================================
// Cache Defaults
// ============================================================================

pub fn cache_file() -> PathBuf {
    ".lastmod-cache.json".into()
}

pub fn fingerprint() -> Strategy {
    Strategy::Mtime
}
