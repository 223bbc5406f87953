//! Manifest comparison.
//!
//! [`diff`] pairs up the entries of two manifests by directory and keeps the
//! directories whose entries differ. The result is keyed in a `BTreeMap`, so
//! iterating over it visits directories in lexicographic order.

use std::collections::{BTreeMap, BTreeSet};

use crate::manifest::{Manifest, ManifestEntry};

/// How a directory changed between two manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// The old and new entry for one changed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChange {
    pub old: Option<ManifestEntry>,
    pub new: Option<ManifestEntry>,
}

impl EntryChange {
    pub fn kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (None, _) => ChangeKind::Added,
            (_, None) => ChangeKind::Removed,
            _ => ChangeKind::Changed,
        }
    }

    /// True when both sides follow the same branch of the same repository, so
    /// only the revision moved.
    pub fn is_rebase(&self) -> bool {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => old.same_branch(new),
            _ => false,
        }
    }
}

/// Changed directories mapped to their old and new entries.
pub type ManifestDiff = BTreeMap<String, EntryChange>;

/// Compare two manifests.
///
/// Every directory present in either manifest whose entries are not
/// structurally equal appears exactly once. Duplicate directories within one
/// manifest resolve to the later entry.
pub fn diff(from: &Manifest, to: &Manifest) -> ManifestDiff {
    let from_entries = from.by_directory();
    let to_entries = to.by_directory();

    let directories: BTreeSet<&str> = from_entries
        .keys()
        .chain(to_entries.keys())
        .copied()
        .collect();

    directories
        .into_iter()
        .filter_map(|directory| {
            let old = from_entries.get(directory).copied();
            let new = to_entries.get(directory).copied();
            if old == new {
                return None;
            }
            Some((
                directory.to_string(),
                EntryChange {
                    old: old.cloned(),
                    new: new.cloned(),
                },
            ))
        })
        .collect()
}

/// Directories bound in `old` that are no longer part of `new`.
pub fn removed_directories(old: &Manifest, new: &Manifest) -> Vec<String> {
    diff(old, new)
        .into_iter()
        .filter(|(_, change)| change.kind() == ChangeKind::Removed)
        .map(|(directory, _)| directory)
        .collect()
}
