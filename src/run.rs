//! Run orchestration.
//!
//! Processes bundles one at a time, in pattern-expansion order.
//!
//! # Per-bundle flow
//!
//! ```text
//! scan_bundle() ──► diff(cache.get()) ──► read descriptor ──► decide() ──► write?
//!      │                                        │                  │
//!      ▼                                        ▼                  ▼
//!   Failed                           InvalidDescriptor    NoImages / Unchanged / Updated
//!
//! every state reached after a successful scan ends with cache.put()
//! ```
//!
//! Errors are isolated per bundle: a failing bundle is reported and the run
//! continues with the next one.

use crate::{
    bundle::{
        BundleError, Inventory,
        cache::FingerprintCache,
        descriptor::Descriptor,
        diff::{DiffResult, diff},
        policy::Decision,
        scan::scan_bundle,
    },
    config::Config,
    log,
    utils::{command::WriteNotifier, glob::expand_dirs},
};
use chrono::{DateTime, Local, TimeZone};
use std::{fmt, fmt::Display, fs, io, path::Path};

/// Terminal state of one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    NoImages,
    Unchanged,
    Updated,
    InvalidDescriptor,
    /// Directory could not be listed or descriptor could not be written.
    Failed,
}

/// What happened to one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub state: BundleState,
    pub diff: DiffResult,
}

/// Aggregate statistics of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub no_images: usize,
    pub invalid: usize,
    pub failed: usize,
    pub added: usize,
    pub changed: usize,
    pub deleted: usize,
}

impl RunStats {
    fn record(&mut self, report: &BundleReport) {
        self.scanned += 1;
        match report.state {
            BundleState::NoImages => self.no_images += 1,
            BundleState::Unchanged => self.unchanged += 1,
            BundleState::Updated => self.updated += 1,
            BundleState::InvalidDescriptor => self.invalid += 1,
            BundleState::Failed => self.failed += 1,
        }
        self.added += report.diff.added;
        self.changed += report.diff.changed;
        self.deleted += report.diff.deleted;
    }
}

impl Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bundles: {} updated, {} unchanged, {} without images, {} invalid, {} failed (images +{} ~{} -{})",
            self.scanned,
            self.updated,
            self.unchanged,
            self.no_images,
            self.invalid,
            self.failed,
            self.added,
            self.changed,
            self.deleted,
        )
    }
}

// ============================================================================
// Descriptor Output
// ============================================================================

/// Where rewritten descriptors go.
pub trait DescriptorWriter {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Writes descriptors in place.
pub struct FsWriter;

impl DescriptorWriter for FsWriter {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        fs::write(path, contents)
    }
}

/// Side effects of writing a descriptor.
#[derive(Clone, Copy)]
pub struct Sinks<'a> {
    pub writer: &'a dyn DescriptorWriter,
    pub notifier: &'a dyn WriteNotifier,
}

impl<'a> Sinks<'a> {
    pub fn new(notifier: &'a dyn WriteNotifier) -> Self {
        Self {
            writer: &FsWriter,
            notifier,
        }
    }
}

// ============================================================================
// Run
// ============================================================================

/// Process every configured bundle using the local clock.
pub fn update_bundles(
    config: &Config,
    cache: &mut FingerprintCache,
    notifier: &dyn WriteNotifier,
) -> RunStats {
    update_bundles_with_clock(config, cache, Sinks::new(notifier), Local::now)
}

/// Process every configured bundle; `clock` is sampled once per bundle.
pub fn update_bundles_with_clock<Tz, C>(
    config: &Config,
    cache: &mut FingerprintCache,
    sinks: Sinks<'_>,
    clock: C,
) -> RunStats
where
    Tz: TimeZone,
    Tz::Offset: Display,
    C: Fn() -> DateTime<Tz>,
{
    let bundles = expand_dirs(&config.root, &config.target_dirs);
    if bundles.is_empty() {
        log!("warn"; "no bundle directories match {:?}", config.target_dirs);
    }

    let mut stats = RunStats::default();
    for dir in &bundles {
        let report = process_bundle(dir, config, cache, sinks, &clock());
        stats.record(&report);
    }
    stats
}

/// Run one bundle to a terminal state.
pub fn process_bundle<Tz>(
    dir: &Path,
    config: &Config,
    cache: &mut FingerprintCache,
    sinks: Sinks<'_>,
    now: &DateTime<Tz>,
) -> BundleReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let id = bundle_id(&config.root, dir);

    let current = match scan_bundle(dir, config) {
        Ok(current) => current,
        Err(err) => {
            log!("error"; "{id}: {:#}", anyhow::Error::from(err));
            return BundleReport {
                state: BundleState::Failed,
                diff: DiffResult::default(),
            };
        }
    };

    let diff = diff(&cache.get(&id), &current);
    let state = match evaluate(dir, &current, &diff, config, sinks, now) {
        Ok(outcome) => {
            outcome.log(&id, &diff, config.dry_run);
            outcome.state()
        }
        Err(err @ BundleError::Descriptor(_)) => {
            log!("warn"; "{id}: invalid descriptor, skipped: {:#} ({diff})", anyhow::Error::from(err));
            BundleState::InvalidDescriptor
        }
        Err(err) => {
            log!("error"; "{id}: {:#} ({diff})", anyhow::Error::from(err));
            BundleState::Failed
        }
    };

    cache.put(&id, current);
    BundleReport { state, diff }
}

/// Successful per-bundle results, with the details worth logging.
enum Outcome {
    NoImages,
    Unchanged {
        current: Option<String>,
        candidate: Option<String>,
    },
    Updated {
        from: Option<String>,
        to: String,
    },
}

impl Outcome {
    const fn state(&self) -> BundleState {
        match self {
            Self::NoImages => BundleState::NoImages,
            Self::Unchanged { .. } => BundleState::Unchanged,
            Self::Updated { .. } => BundleState::Updated,
        }
    }

    fn log(&self, id: &str, diff: &DiffResult, dry_run: bool) {
        match self {
            Self::NoImages => log!("bundle"; "{id}: no images, skipped ({diff})"),
            Self::Unchanged { current, candidate } => {
                let current = current.as_deref().unwrap_or("<unset>");
                match candidate {
                    Some(candidate) => log!(
                        "bundle";
                        "{id}: unchanged at {current}, candidate {candidate} not newer ({diff})"
                    ),
                    None => log!("bundle"; "{id}: unchanged at {current} ({diff})"),
                }
            }
            Self::Updated { from, to } => {
                let from = from.as_deref().unwrap_or("<unset>");
                if dry_run {
                    log!("dry-run"; "{id}: would update {from} -> {to} ({diff})");
                } else {
                    log!("bundle"; "{id}: updated {from} -> {to} ({diff})");
                }
            }
        }
    }
}

/// Decide and, unless simulating, rewrite the descriptor.
fn evaluate<Tz>(
    dir: &Path,
    current: &Inventory,
    diff: &DiffResult,
    config: &Config,
    sinks: Sinks<'_>,
    now: &DateTime<Tz>,
) -> Result<Outcome, BundleError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if current.is_empty() {
        return Ok(Outcome::NoImages);
    }

    let path = dir.join(&config.index_file);
    let descriptor = Descriptor::read(&path, &config.frontmatter_delim)?;
    let lastmod = descriptor.lastmod();

    match config
        .fingerprint
        .decide(diff, current, lastmod.as_deref(), now)
    {
        Decision::Unchanged { candidate } => Ok(Outcome::Unchanged {
            current: lastmod,
            candidate,
        }),
        Decision::Update(value) => {
            if !config.dry_run {
                sinks
                    .writer
                    .write(&path, &descriptor.render(&value))
                    .map_err(|err| BundleError::Write(path.clone(), err))?;
                sinks.notifier.notify_written(&path);
            }
            Ok(Outcome::Updated {
                from: lastmod,
                to: value,
            })
        }
    }
}

/// Root-relative, `/`-separated identifier of a bundle directory.
pub fn bundle_id(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => dir.to_string_lossy().into_owned(),
    }
}

// ============================================================================
// Tests
// ============================================================================
