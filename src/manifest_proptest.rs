//! Property-based tests for manifest parsing and diffing.
//!
//! These tests use proptest to generate random manifests and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::diff::{diff, ChangeKind};
    use crate::manifest::{parse, Manifest, ManifestEntry, TRACK_TIP, VCS_GIT};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn entry_strategy() -> impl Strategy<Value = ManifestEntry> {
        (
            "[a-z][a-z0-9_/]{0,12}",
            "[a-z]{1,6}",
            prop_oneof!["master", "dev", "release/[0-9]"],
            prop_oneof![Just(TRACK_TIP.to_string()), "[0-9a-f]{40}"],
        )
            .prop_map(|(directory, host, branch, revision)| {
                ManifestEntry::new(
                    directory,
                    format!("git://{}/repo", host),
                    VCS_GIT,
                    branch,
                    revision,
                )
            })
    }

    /// Manifests without duplicate directories.
    fn manifest_strategy() -> impl Strategy<Value = Manifest> {
        prop::collection::vec(entry_strategy(), 0..8).prop_map(|entries| {
            let mut seen = BTreeSet::new();
            Manifest::from_entries(
                entries
                    .into_iter()
                    .filter(|entry| seen.insert(entry.directory.clone())),
            )
        })
    }

    // ============================================================================
    // parse / serialize property tests
    // ============================================================================

    proptest! {
        /// Property: serializing and parsing again yields the same entries in
        /// the same order
        #[test]
        fn serialize_then_parse_preserves_entries(manifest in manifest_strategy()) {
            let reparsed = parse(&manifest.serialize(), "roundtrip").unwrap();
            prop_assert_eq!(reparsed.entries, manifest.entries);
        }

        /// Property: comment and blank lines never change the parse result
        #[test]
        fn comments_and_blank_lines_are_ignored(
            manifest in manifest_strategy(),
            comment in "[ \t]*#[ -~]{0,20}",
        ) {
            let mut text = String::new();
            for entry in &manifest.entries {
                text.push_str(&comment);
                text.push('\n');
                text.push('\n');
                text.push_str(&entry.to_string());
                text.push('\n');
            }
            let parsed = parse(&text, "commented").unwrap();
            prop_assert_eq!(parsed.entries, manifest.entries);
        }

        /// Property: any significant line with a field count other than five
        /// is rejected
        #[test]
        fn wrong_field_count_is_rejected(
            fields in prop::collection::vec("[a-z0-9]{1,5}", 1..10)
                .prop_filter("five fields is valid", |f| f.len() != 5),
        ) {
            prop_assert!(parse(&fields.join(" "), "fields").is_err());
        }
    }

    // ============================================================================
    // diff property tests
    // ============================================================================

    proptest! {
        /// Property: a manifest never differs from itself
        #[test]
        fn diff_with_itself_is_empty(manifest in manifest_strategy()) {
            prop_assert!(diff(&manifest, &manifest).is_empty());
        }

        /// Property: diff(a, b) and diff(b, a) touch the same directories with
        /// old and new swapped
        #[test]
        fn diff_is_symmetric(a in manifest_strategy(), b in manifest_strategy()) {
            let forward = diff(&a, &b);
            let backward = diff(&b, &a);
            prop_assert_eq!(
                forward.keys().collect::<Vec<_>>(),
                backward.keys().collect::<Vec<_>>()
            );
            for (directory, change) in &forward {
                let reverse = &backward[directory];
                prop_assert_eq!(&change.old, &reverse.new);
                prop_assert_eq!(&change.new, &reverse.old);
            }
        }

        /// Property: entry order does not matter for equality or diffs
        #[test]
        fn order_is_irrelevant(manifest in manifest_strategy()) {
            let reversed = Manifest::from_entries(manifest.entries.iter().rev().cloned());
            prop_assert_eq!(&reversed, &manifest);
            prop_assert!(diff(&manifest, &reversed).is_empty());
        }

        /// Property: every directory that appears on only one side is reported
        /// as added or removed
        #[test]
        fn one_sided_directories_are_added_or_removed(
            a in manifest_strategy(),
            b in manifest_strategy(),
        ) {
            let changes = diff(&a, &b);
            for (directory, change) in &changes {
                let kind = change.kind();
                match (a.get(directory), b.get(directory)) {
                    (None, Some(_)) => prop_assert_eq!(kind, ChangeKind::Added),
                    (Some(_), None) => prop_assert_eq!(kind, ChangeKind::Removed),
                    (Some(old), Some(new)) => {
                        prop_assert_eq!(kind, ChangeKind::Changed);
                        prop_assert_ne!(old, new);
                    }
                    (None, None) => prop_assert!(false, "unknown directory {}", directory),
                }
            }
        }
    }
}
