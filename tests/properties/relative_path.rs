//! Property tests for relative path normalization.

use proptest::prelude::*;

use treesync::domain::value_objects::relative_path::{ancestors, join, normalize};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: `normalize` never panics on arbitrary input.
    #[test]
    fn property_normalize_never_panics(input in "(?s).{0,64}") {
        let _ = normalize(&input);
    }

    /// PROPERTY: normalizing twice gives the same result as once.
    #[test]
    fn property_normalize_is_idempotent(input in "[a-z./]{0,24}") {
        if let Ok(once) = normalize(&input) {
            prop_assert_eq!(normalize(&once), Ok(once.clone()));
        }
    }

    /// PROPERTY: a normalized path never escapes or addresses the root.
    #[test]
    fn property_normalized_paths_stay_inside(input in "[a-z./]{0,24}") {
        if let Ok(path) = normalize(&input) {
            prop_assert!(!path.is_empty());
            prop_assert!(!path.starts_with('/'));
            prop_assert!(!path.ends_with('/'));
            prop_assert!(path.split('/').all(|s| !s.is_empty() && s != "." && s != ".."));
        }
    }

    /// PROPERTY: every ancestor joined with the remainder rebuilds the path.
    #[test]
    fn property_ancestors_are_prefixes(
        segments in proptest::collection::vec("[a-z]{1,5}", 1..=5)
    ) {
        let path = segments.join("/");
        let found = ancestors(&path);
        prop_assert_eq!(found.len(), segments.len() - 1);
        for (depth, ancestor) in found.iter().enumerate() {
            prop_assert_eq!(*ancestor, segments[..=depth].join("/"));
        }
        let rebuilt = segments.iter().fold(String::new(), |acc, s| join(&acc, s));
        prop_assert_eq!(rebuilt, path);
    }
}
