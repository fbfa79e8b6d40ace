//! Bundle inventory scanning.
//!
//! Files are enumerated sequentially (sorted by name, so the walk is
//! deterministic) and fingerprinted in parallel. A file that vanishes between
//! the two steps is left out of the inventory.

use super::{ImageEntry, Inventory, ScanError, Strategy};
use crate::config::Config;
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use walkdir::WalkDir;

/// Build the current inventory of the bundle at `dir`.
///
/// Only fails if `dir` itself cannot be listed.
pub fn scan_bundle(dir: &Path, config: &Config) -> Result<Inventory, ScanError> {
    fs::read_dir(dir).map_err(|source| ScanError {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = collect_images(dir, config);

    let inventory = files
        .par_iter()
        .filter_map(|path| {
            let key = relative_key(dir, path)?;
            let entry = fingerprint(path, config.fingerprint).ok()?;
            Some((key, entry))
        })
        .collect();

    Ok(inventory)
}

/// Image files under `dir`, no deeper than `config.max_depth`.
fn collect_images(dir: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(config.max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| config.is_image(e.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// `/`-separated path of `path` relative to `dir`.
fn relative_key(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

/// Fingerprint a single file according to `strategy`.
pub fn fingerprint(path: &Path, strategy: Strategy) -> io::Result<ImageEntry> {
    let metadata = fs::metadata(path)?;
    let size = metadata.len();

    match strategy {
        Strategy::Mtime => Ok(ImageEntry::mtime(to_millis(metadata.modified()?), size)),
        Strategy::Hash => {
            let mut file = File::open(path)?;
            let mut hasher = blake3::Hasher::new();
            io::copy(&mut file, &mut hasher)?;
            Ok(ImageEntry::hash(hasher.finalize().to_hex().to_string(), size))
        }
    }
}

/// Milliseconds since the Unix epoch, negative for earlier times.
fn to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}
