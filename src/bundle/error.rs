//! Bundle processing error types.

use std::path::PathBuf;
use thiserror::Error;

/// The bundle directory itself could not be listed.
#[derive(Debug, Error)]
#[error("cannot list bundle directory `{path}`")]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Descriptor could not be read or has no valid header block.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("cannot read descriptor `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("descriptor has no header block: expected two `{0}` lines, found {1}")]
    MissingDelimiters(String, usize),
}

/// Fatal cache failures. A corrupt or outdated cache is not an error.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error on cache file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("cannot serialize cache")]
    Serialize(#[from] serde_json::Error),
}

/// Per-bundle failure, isolated by the orchestrator.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("cannot write descriptor `{0}`")]
    Write(PathBuf, #[source] std::io::Error),
}
