//! Cross-run fingerprint cache.
//!
//! Persisted as pretty JSON:
//!
//! ```json
//! {
//!   "version": 2,
//!   "strategy": "mtime",
//!   "bundles": {
//!     "content/galleries/alps": {
//!       "images": { "img/01.jpg": { "mtime": 1717200000000, "size": 482113 } }
//!     }
//!   }
//! }
//! ```
//!
//! A cache written by another schema version or strategy is discarded and the
//! run starts from an empty baseline. An unparseable cache file is treated the
//! same way, with a warning.

use super::{CacheError, Inventory, Strategy};
use crate::log;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

/// Bump whenever the persisted layout changes.
pub const CACHE_VERSION: u32 = 2;

/// Last-known state of one bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRecord {
    #[serde(default)]
    pub images: Inventory,
}

/// Serialized cache content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheState {
    pub version: u32,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub bundles: BTreeMap<String, BundleRecord>,
}

/// Fields read before committing to the full layout.
#[derive(Deserialize)]
struct CacheHeader {
    version: u32,
}

impl CacheState {
    pub const fn empty(strategy: Strategy) -> Self {
        Self {
            version: CACHE_VERSION,
            strategy: Some(strategy),
            bundles: BTreeMap::new(),
        }
    }
}

/// How the cache was obtained at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Valid cache file read.
    Loaded,
    /// No cache file yet.
    Missing,
    /// Version or strategy differed; discarded.
    Reset,
    /// File could not be parsed; discarded.
    Corrupt,
}

/// In-memory fingerprint cache bound to its file.
#[derive(Debug)]
pub struct FingerprintCache {
    path: PathBuf,
    state: CacheState,
}

impl FingerprintCache {
    /// Read the cache at `path`.
    ///
    /// Only I/O failures other than "not found" are errors.
    pub fn load(path: &Path, strategy: Strategy) -> Result<(Self, LoadOutcome), CacheError> {
        let empty = |outcome| -> Result<(Self, LoadOutcome), CacheError> {
            let cache = Self {
                path: path.to_path_buf(),
                state: CacheState::empty(strategy),
            };
            Ok((cache, outcome))
        };

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return empty(LoadOutcome::Missing);
            }
            Err(err) => return Err(CacheError::Io(path.to_path_buf(), err)),
        };

        let corrupt = |err: serde_json::Error| {
            log!("warn"; "cache `{}` is unreadable ({err}), starting from an empty cache", path.display());
            empty(LoadOutcome::Corrupt)
        };

        // Older layouts may not parse as the current one; check the version first.
        let header: CacheHeader = match serde_json::from_slice(&content) {
            Ok(header) => header,
            Err(err) => return corrupt(err),
        };
        if header.version != CACHE_VERSION {
            log!("cache"; "cache version {} != {CACHE_VERSION}, resetting", header.version);
            return empty(LoadOutcome::Reset);
        }

        let state: CacheState = match serde_json::from_slice(&content) {
            Ok(state) => state,
            Err(err) => return corrupt(err),
        };
        if state.strategy != Some(strategy) {
            log!("cache"; "fingerprint strategy changed to `{}`, resetting", strategy.name());
            return empty(LoadOutcome::Reset);
        }

        let cache = Self {
            path: path.to_path_buf(),
            state,
        };
        Ok((cache, LoadOutcome::Loaded))
    }

    /// Previous inventory of `bundle_id`; empty if never seen.
    pub fn get(&self, bundle_id: &str) -> Inventory {
        self.state
            .bundles
            .get(bundle_id)
            .map(|record| record.images.clone())
            .unwrap_or_default()
    }

    /// Record the current inventory of `bundle_id`, replacing the old one.
    pub fn put(&mut self, bundle_id: &str, images: Inventory) {
        self.state
            .bundles
            .insert(bundle_id.to_owned(), BundleRecord { images });
    }

    pub const fn state(&self) -> &CacheState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole state next to the target and rename it into place.
    pub fn persist(&self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.state)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| CacheError::Io(parent.to_path_buf(), err))?;
        }

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, json + "\n").map_err(|err| CacheError::Io(tmp.clone(), err))?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            fs::remove_file(&tmp).ok();
            CacheError::Io(self.path.clone(), err)
        })
    }
}

/// Sibling temporary path used for atomic replacement.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ImageEntry;
    use tempfile::TempDir;

    fn sample_inventory() -> Inventory {
        let mut images = Inventory::new();
        images.insert("a.jpg".into(), ImageEntry::mtime(1_000, 100));
        images.insert("sub/b.jpg".into(), ImageEntry::mtime(2_000, 50));
        images
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let (cache, outcome) =
            FingerprintCache::load(&dir.path().join("cache.json"), Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Missing);
        assert_eq!(cache.state(), &CacheState::empty(Strategy::Mtime));
        assert!(cache.get("anything").is_empty());
    }

    #[test]
    fn test_put_get_persist_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let (mut cache, _) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        cache.put("content/galleries/alps", sample_inventory());
        cache.put("content/galleries/empty", Inventory::new());
        cache.persist().unwrap();

        let (reloaded, outcome) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(reloaded.get("content/galleries/alps"), sample_inventory());
        assert!(reloaded.get("content/galleries/empty").is_empty());
        assert!(reloaded.state().bundles.contains_key("content/galleries/empty"));
        assert!(!dir.path().join("cache.json.tmp").exists());
    }

    #[test]
    fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) =
            FingerprintCache::load(&dir.path().join("c.json"), Strategy::Mtime).unwrap();
        cache.put("x", sample_inventory());
        cache.put("x", Inventory::new());
        assert!(cache.get("x").is_empty());
        assert_eq!(cache.state().bundles.len(), 1);
    }

    #[test]
    fn test_version_mismatch_resets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"version": 1, "bundles": {"a": {"images": {"x.jpg": {"mtime": 1, "size": 1}}}}}"#,
        )
        .unwrap();

        let (cache, outcome) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Reset);
        assert!(cache.get("a").is_empty());
    }

    #[test]
    fn test_old_layout_resets_instead_of_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"version": 1, "bundles": {"a": {"images": {"x.jpg": {"mtimeMs": 1, "size": 1}}}}}"#,
        )
        .unwrap();

        let (cache, outcome) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Reset);
        assert!(cache.get("a").is_empty());
    }

    #[test]
    fn test_strategy_mismatch_resets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let (mut cache, _) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        cache.put("a", sample_inventory());
        cache.persist().unwrap();

        let (cache, outcome) = FingerprintCache::load(&path, Strategy::Hash).unwrap();
        assert_eq!(outcome, LoadOutcome::Reset);
        assert!(cache.get("a").is_empty());
    }

    #[test]
    fn test_corrupt_cache_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let (cache, outcome) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Corrupt);
        assert!(cache.state().bundles.is_empty());
    }

    #[test]
    fn test_non_utf8_cache_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let (cache, outcome) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Corrupt);
        assert!(cache.state().bundles.is_empty());
    }

    #[test]
    fn test_current_version_with_bad_entries_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"version": 2, "strategy": "mtime", "bundles": {"a": {"images": {"x.jpg": {"size": 1}}}}}"#,
        )
        .unwrap();

        let (_, outcome) = FingerprintCache::load(&path, Strategy::Mtime).unwrap();
        assert_eq!(outcome, LoadOutcome::Corrupt);
    }

    #[test]
    fn test_unreadable_cache_is_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read.
        let path = dir.path().join("cache.json");
        fs::create_dir(&path).unwrap();
        assert!(FingerprintCache::load(&path, Strategy::Mtime).is_err());
    }

    #[test]
    fn test_persist_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/cache.json");
        let (cache, _) = FingerprintCache::load(&path, Strategy::Hash).unwrap();
        cache.persist().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(
            tmp_path(Path::new("/site/.lastmod-cache.json")),
            PathBuf::from("/site/.lastmod-cache.json.tmp")
        );
    }
}
