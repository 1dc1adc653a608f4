//! Property tests for per-entry planning decisions.

use std::time::{Duration, UNIX_EPOCH};

use proptest::prelude::*;

use treesync::domain::entities::{TimestampResolution, TreeEntry};
use treesync::domain::services::{Planner, SyncAction};
use treesync::FilterChain;

fn file_at_millis(path: &str, millis: u64) -> TreeEntry {
    TreeEntry::file(path, UNIX_EPOCH + Duration::from_millis(millis), 1)
}

fn resolution() -> impl Strategy<Value = TimestampResolution> {
    prop_oneof![
        Just(TimestampResolution::Nanos),
        Just(TimestampResolution::Seconds),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: after copying (equal times) a file is never copied again.
    #[test]
    fn property_equal_times_are_stable(millis in 0u64..10_000_000, res in resolution()) {
        let source = file_at_millis("a", millis);
        let destination = file_at_millis("a", millis);
        prop_assert_eq!(
            Planner::plan_file(&source, Some(&destination), false, res),
            SyncAction::SkipUnchanged
        );
    }

    /// PROPERTY: at second resolution, sub-second differences never copy.
    #[test]
    fn property_seconds_ignore_fractions(secs in 0u64..1_000_000, a in 0u64..1000, b in 0u64..1000) {
        let source = file_at_millis("a", secs * 1000 + a);
        let destination = file_at_millis("a", secs * 1000 + b);
        prop_assert_eq!(
            Planner::plan_file(&source, Some(&destination), false, TimestampResolution::Seconds),
            SyncAction::SkipUnchanged
        );
    }

    /// PROPERTY: force copies regardless of times.
    #[test]
    fn property_force_always_copies(
        s in 0u64..10_000_000,
        d in 0u64..10_000_000,
        res in resolution(),
    ) {
        let source = file_at_millis("a", s);
        let destination = file_at_millis("a", d);
        prop_assert_eq!(
            Planner::plan_file(&source, Some(&destination), true, res),
            SyncAction::CopyFile
        );
    }

    /// PROPERTY: identical listings leave nothing to delete.
    #[test]
    fn property_identical_children_are_not_extraneous(
        names in proptest::collection::btree_set("[a-z]{1,6}", 0..=8)
    ) {
        let children: Vec<TreeEntry> = names
            .iter()
            .map(|name| file_at_millis(name, 0))
            .collect();
        prop_assert!(Planner::extraneous(&children, &children, &FilterChain::new()).is_empty());
    }
}
