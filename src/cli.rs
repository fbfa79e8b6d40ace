//! Command-line interface definitions.
//!
//! Defines all CLI arguments using clap.

use crate::bundle::Strategy;
use clap::Parser;
use std::path::PathBuf;

/// Keep `lastmod` of image bundles in sync with their images
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: lastmod.json)
    #[arg(short = 'C', long, default_value = "lastmod.json")]
    pub config: PathBuf,

    /// Compute and report everything, but write neither descriptors nor the cache
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Fingerprint strategy: `mtime` (timestamp-based) or `hash` (content-based)
    #[arg(long, value_enum)]
    pub fingerprint: Option<Strategy>,

    /// Stage every rewritten descriptor with `git add`
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub git_add: Option<bool>,

    /// Maximum directory depth scanned inside a bundle (1 = bundle directory only)
    #[arg(long)]
    pub max_depth: Option<usize>,
}
