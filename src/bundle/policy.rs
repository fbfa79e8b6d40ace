//! `lastmod` decision policy.
//!
//! | strategy | candidate                     | update when                          |
//! |----------|-------------------------------|--------------------------------------|
//! | `mtime`  | newest image mtime            | no current value, or candidate later |
//! | `hash`   | wall-clock time of evaluation | diff non-empty and candidate later   |
//!
//! Bundles without images never get a candidate; callers skip them before
//! reading the descriptor.

use super::{Inventory, Strategy, diff::DiffResult};
use crate::utils::date::{format_lastmod, from_millis};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Outcome of evaluating one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The current value stays; `candidate` is the value that lost, if any.
    Unchanged { candidate: Option<String> },
    /// Write this value.
    Update(String),
}

impl Strategy {
    /// Candidate `lastmod`, `None` for an empty inventory.
    ///
    /// `now` supplies both the wall clock (hash) and the output offset (mtime).
    pub fn candidate<Tz: TimeZone>(
        self,
        diff: &DiffResult,
        inventory: &Inventory,
        now: &DateTime<Tz>,
    ) -> Option<String>
    where
        Tz::Offset: Display,
    {
        if inventory.is_empty() {
            return None;
        }
        match self {
            Self::Mtime => {
                let newest = inventory.values().filter_map(|e| e.mtime_ms()).max()?;
                from_millis(newest, &now.timezone()).map(|dt| format_lastmod(&dt))
            }
            Self::Hash => (!diff.is_empty()).then(|| format_lastmod(now)),
        }
    }

    /// Decide whether `current` must be replaced.
    pub fn decide<Tz: TimeZone>(
        self,
        diff: &DiffResult,
        inventory: &Inventory,
        current: Option<&str>,
        now: &DateTime<Tz>,
    ) -> Decision
    where
        Tz::Offset: Display,
    {
        match self.candidate(diff, inventory, now) {
            Some(candidate) if supersedes(&candidate, current) => Decision::Update(candidate),
            candidate => Decision::Unchanged { candidate },
        }
    }
}

/// A candidate wins over an unset value or a lexicographically smaller one.
///
/// Ties and earlier candidates (e.g. clock skew) keep the current value.
pub fn supersedes(candidate: &str, current: Option<&str>) -> bool {
    match current {
        None => true,
        Some(current) => candidate > current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ImageEntry;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn mtime_inventory(mtimes: &[i64]) -> Inventory {
        mtimes
            .iter()
            .enumerate()
            .map(|(i, ms)| (format!("{i}.jpg"), ImageEntry::mtime(*ms, 1)))
            .collect()
    }

    fn changed(n: usize) -> DiffResult {
        DiffResult {
            added: 0,
            changed: n,
            deleted: 0,
        }
    }

    #[test]
    fn test_mtime_newer_candidate_updates() {
        let inventory = mtime_inventory(&[1_700_000_000_000, 1_748_736_000_000]);
        let decision = Strategy::Mtime.decide(
            &DiffResult::default(),
            &inventory,
            Some("2024-01-01T00:00:00+00:00"),
            &now(),
        );
        assert_eq!(decision, Decision::Update("2025-06-01T00:00:00+00:00".into()));
    }

    #[test]
    fn test_mtime_tie_is_unchanged() {
        let inventory = mtime_inventory(&[1_748_736_000_000]);
        let decision = Strategy::Mtime.decide(
            &changed(1),
            &inventory,
            Some("2025-06-01T00:00:00+00:00"),
            &now(),
        );
        assert!(matches!(decision, Decision::Unchanged { .. }));
    }

    #[test]
    fn test_mtime_older_candidate_is_unchanged() {
        let inventory = mtime_inventory(&[1_700_000_000_000]);
        let decision = Strategy::Mtime.decide(
            &changed(3),
            &inventory,
            Some("2025-06-01T00:00:00+00:00"),
            &now(),
        );
        assert_eq!(
            decision,
            Decision::Unchanged {
                candidate: Some("2023-11-14T22:13:20+00:00".into())
            }
        );
    }

    #[test]
    fn test_mtime_missing_current_updates() {
        let inventory = mtime_inventory(&[1_700_000_000_000]);
        let decision = Strategy::Mtime.decide(&DiffResult::default(), &inventory, None, &now());
        assert_eq!(decision, Decision::Update("2023-11-14T22:13:20+00:00".into()));
    }

    #[test]
    fn test_mtime_ignores_diff() {
        // an empty diff still updates when the descriptor is behind
        let inventory = mtime_inventory(&[1_748_736_000_000]);
        let decision = Strategy::Mtime.decide(
            &DiffResult::default(),
            &inventory,
            Some("2020-01-01T00:00:00+00:00"),
            &now(),
        );
        assert!(matches!(decision, Decision::Update(_)));
    }

    #[test]
    fn test_empty_inventory_has_no_candidate() {
        for strategy in [Strategy::Mtime, Strategy::Hash] {
            let decision = strategy.decide(&changed(2), &Inventory::new(), None, &now());
            assert_eq!(decision, Decision::Unchanged { candidate: None });
        }
    }

    #[test]
    fn test_hash_with_changes_uses_now() {
        let mut inventory = Inventory::new();
        inventory.insert("a.jpg".into(), ImageEntry::hash("aa", 1));
        let decision = Strategy::Hash.decide(
            &changed(1),
            &inventory,
            Some("2025-06-01T00:00:00+00:00"),
            &now(),
        );
        assert_eq!(decision, Decision::Update("2026-01-01T12:00:00+00:00".into()));
    }

    #[test]
    fn test_hash_without_changes_is_unchanged() {
        let mut inventory = Inventory::new();
        inventory.insert("a.jpg".into(), ImageEntry::hash("aa", 1));
        let decision = Strategy::Hash.decide(&DiffResult::default(), &inventory, None, &now());
        assert_eq!(decision, Decision::Unchanged { candidate: None });
    }

    #[test]
    fn test_hash_clock_skew_is_noop() {
        let mut inventory = Inventory::new();
        inventory.insert("a.jpg".into(), ImageEntry::hash("aa", 1));
        let decision = Strategy::Hash.decide(
            &changed(1),
            &inventory,
            Some("2099-01-01T00:00:00+00:00"),
            &now(),
        );
        assert!(matches!(decision, Decision::Unchanged { candidate: Some(_) }));
    }

    #[test]
    fn test_supersedes() {
        assert!(supersedes("2025-01-01T00:00:00+00:00", None));
        assert!(supersedes("2025-01-01T00:00:01+00:00", Some("2025-01-01T00:00:00+00:00")));
        assert!(!supersedes("2025-01-01T00:00:00+00:00", Some("2025-01-01T00:00:00+00:00")));
        assert!(!supersedes("2024-01-01T00:00:00+00:00", Some("2025-01-01T00:00:00+00:00")));
    }
}
