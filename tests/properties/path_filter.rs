//! Property tests for include/exclude filtering.

use proptest::prelude::*;

use treesync::{FilterChain, PathFilter};

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9_.]{1,6}").unwrap()
}

fn rel_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..=4).prop_map(|segments| segments.join("/"))
}

fn prefixes() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(rel_path(), 0..=3)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a path starting with any exclude prefix is rejected,
    /// whatever the includes say.
    #[test]
    fn property_exclude_always_rejects(
        include in prefixes(),
        exclude in prefixes(),
        suffix in "[a-z/]{0,8}",
    ) {
        let filter = PathFilter::new(include, exclude.clone());
        for prefix in &exclude {
            let path = format!("{}{}", prefix, suffix);
            prop_assert!(!filter.accept(&path), "{} should be excluded", path);
        }
    }

    /// PROPERTY: without excludes, includes never reject anything.
    #[test]
    fn property_includes_alone_accept_everything(
        include in prefixes(),
        path in rel_path(),
    ) {
        let filter = PathFilter::new(include, Vec::new());
        prop_assert!(filter.accept(&path));
    }

    /// PROPERTY: with excludes present, an accepted path matches some include.
    #[test]
    fn property_gated_accept_implies_include_match(
        include in proptest::collection::vec(rel_path(), 1..=3),
        exclude in proptest::collection::vec(rel_path(), 1..=3),
        path in rel_path(),
    ) {
        let filter = PathFilter::new(include.clone(), exclude);
        if filter.accept(&path) {
            prop_assert!(include.iter().any(|prefix| path.starts_with(prefix.as_str())));
        }
    }

    /// PROPERTY: a chain accepts exactly when every member accepts.
    #[test]
    fn property_chain_is_conjunction(
        filters in proptest::collection::vec((prefixes(), prefixes()), 0..=3),
        path in rel_path(),
    ) {
        let filters: Vec<PathFilter> = filters
            .into_iter()
            .map(|(include, exclude)| PathFilter::new(include, exclude))
            .collect();
        let chain = filters
            .iter()
            .cloned()
            .fold(FilterChain::new(), FilterChain::with);

        let expected = filters.iter().all(|filter| filter.accept(&path));
        prop_assert_eq!(chain.accept(&path), expected);
    }
}
