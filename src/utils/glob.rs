//! Directory pattern expansion.
//!
//! Patterns are relative to the project root and use git wildmatch syntax:
//! `*` and `?` stay within one path component, `**` crosses components.
//!
//! ```text
//! content/galleries/*     -> content/galleries/alps, content/galleries/fjords
//! content/**/2024-*       -> any directory named 2024-* below content/
//! content/about           -> content/about (if it is a directory)
//! ```

use gix::glob::wildmatch;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Expand `patterns` into existing directories.
///
/// Matches of one pattern are sorted; a directory matched by several
/// patterns is reported once, at its first position.
pub fn expand_dirs(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    patterns
        .iter()
        .flat_map(|pattern| expand_pattern(root, pattern))
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

/// Expand a single pattern.
fn expand_pattern(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let pattern = normalize_pattern(pattern);
    if pattern.is_empty() {
        return Vec::new();
    }
    let (prefix, rest) = split_literal_prefix(&pattern);
    let base = root.join(prefix);

    let Some(rest) = rest else {
        return if base.is_dir() { vec![base] } else { Vec::new() };
    };

    let max_depth = if rest.contains("**") {
        usize::MAX
    } else {
        rest.split('/').count()
    };

    let mut dirs: Vec<PathBuf> = WalkDir::new(&base)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| {
            to_slash(e.path(), &base).is_some_and(|relative| {
                wildmatch(
                    rest.into(),
                    relative.as_str().into(),
                    wildmatch::Mode::NO_MATCH_SLASH_LITERAL,
                )
            })
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    dirs.sort();
    dirs
}

/// Trim whitespace, a leading `./` and trailing slashes.
fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    pattern.trim_end_matches('/').to_owned()
}

/// Split into the leading components without glob characters and the rest.
fn split_literal_prefix(pattern: &str) -> (&str, Option<&str>) {
    let mut offset = 0;
    for component in pattern.split('/') {
        if is_glob(component) {
            let prefix = pattern[..offset].trim_end_matches('/');
            return (prefix, Some(&pattern[offset..]));
        }
        offset += component.len() + 1;
    }
    (pattern, None)
}

#[inline]
fn is_glob(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// `/`-separated path of `path` relative to `base`.
fn to_slash(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
