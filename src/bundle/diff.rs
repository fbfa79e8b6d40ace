//! Inventory comparison.

use super::Inventory;

/// Per-bundle change counts between two inventories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: usize,
    pub changed: usize,
    pub deleted: usize,
}

impl DiffResult {
    #[inline]
    pub const fn total(&self) -> usize {
        self.added + self.changed + self.deleted
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl std::fmt::Display for DiffResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{} ~{} -{}", self.added, self.changed, self.deleted)
    }
}

/// Count added, changed and deleted entries going from `previous` to `current`.
///
/// An entry counts as changed when its size or its fingerprint differs.
pub fn diff(previous: &Inventory, current: &Inventory) -> DiffResult {
    let mut result = DiffResult::default();

    for (path, entry) in current {
        match previous.get(path) {
            None => result.added += 1,
            Some(old) if old != entry => result.changed += 1,
            Some(_) => {}
        }
    }

    result.deleted = previous
        .keys()
        .filter(|path| !current.contains_key(*path))
        .count();

    result
}
