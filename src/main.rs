//! lastmod - keep the `lastmod` field of image bundles up to date.

mod bundle;
mod cli;
mod config;
mod logger;
mod run;
mod utils;

use anyhow::{Context, Result};
use bundle::cache::{FingerprintCache, LoadOutcome};
use clap::Parser;
use cli::Cli;
use config::Config;
use run::update_bundles;
use utils::command::{GitAdd, Silent, WriteNotifier};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let cache_path = config.cache_path();
    let (mut cache, outcome) = FingerprintCache::load(&cache_path, config.fingerprint)
        .with_context(|| format!("Failed to load cache `{}`", cache_path.display()))?;
    if outcome == LoadOutcome::Loaded {
        log!("cache"; "{} bundles known from {}", cache.state().bundles.len(), cache.path().display());
    }

    let notifier: Box<dyn WriteNotifier> = if config.git_add && !config.dry_run {
        Box::new(GitAdd::new(&config.root))
    } else {
        Box::new(Silent)
    };

    let stats = update_bundles(&config, &mut cache, notifier.as_ref());

    if config.dry_run {
        log!("dry-run"; "nothing written");
    } else {
        cache
            .persist()
            .with_context(|| format!("Failed to write cache `{}`", cache.path().display()))?;
    }

    log!("done"; "{stats}");
    Ok(())
}
