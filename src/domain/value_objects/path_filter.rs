//! Include/exclude path filtering
//!
//! A [`PathFilter`] is a pure predicate over relative paths built from two
//! ordered lists of string prefixes. Filters compose through a
//! [`FilterChain`], which accepts a path only when every member accepts it.

use serde::{Deserialize, Serialize};

use super::relative_path::{validate_prefix, PathError};

/// Prefix-based include/exclude policy.
///
/// Evaluation order:
/// 1. any exclude prefix matches: reject
/// 2. excludes non-empty and includes non-empty: accept only on an include match
/// 3. otherwise accept
///
/// Include prefixes have no effect unless at least one exclude prefix is
/// configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilter {
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

impl PathFilter {
    /// Build a filter without validating the prefixes
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Build a filter, rejecting absolute or `..`-escaping prefixes
    pub fn validated(include: Vec<String>, exclude: Vec<String>) -> Result<Self, PathError> {
        for prefix in include.iter().chain(exclude.iter()) {
            validate_prefix(prefix)?;
        }
        Ok(Self::new(include, exclude))
    }

    /// Filter that only excludes
    pub fn excluding<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Vec::new(), prefixes.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self) -> &[String] {
        &self.include
    }

    pub fn excludes(&self) -> &[String] {
        &self.exclude
    }

    /// Whether include prefixes take part in the decision
    pub fn is_include_gated(&self) -> bool {
        !self.exclude.is_empty() && !self.include.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn accept(&self, relative_path: &str) -> bool {
        if self
            .exclude
            .iter()
            .any(|prefix| relative_path.starts_with(prefix.as_str()))
        {
            return false;
        }

        if self.is_include_gated() {
            return self
                .include
                .iter()
                .any(|prefix| relative_path.starts_with(prefix.as_str()));
        }

        true
    }
}

/// Logical AND over a list of filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<PathFilter>,
}

impl FilterChain {
    /// Empty chain (accepts everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter to the chain. Empty filters are dropped.
    pub fn with(mut self, filter: PathFilter) -> Self {
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Concatenate two chains
    pub fn and(mut self, other: FilterChain) -> Self {
        self.filters.extend(other.filters);
        self
    }

    pub fn accept(&self, relative_path: &str) -> bool {
        self.filters.iter().all(|filter| filter.accept(relative_path))
    }

    pub fn filters(&self) -> &[PathFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl From<PathFilter> for FilterChain {
    fn from(filter: PathFilter) -> Self {
        Self::new().with(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = PathFilter::default();
        assert!(filter.accept("a.txt"));
        assert!(filter.accept("deep/nested/file"));
    }

    #[test]
    fn exclude_prefix_rejects_subtree() {
        let filter = PathFilter::excluding(["sub"]);
        assert!(!filter.accept("sub"));
        assert!(!filter.accept("sub/b.txt"));
        assert!(filter.accept("a.txt"));
    }

    #[test]
    fn exclude_is_a_raw_string_prefix() {
        let filter = PathFilter::excluding(["sub"]);
        assert!(!filter.accept("subway.txt"));
    }

    #[test]
    fn include_alone_does_not_restrict() {
        // includes only take effect once excludes are configured as well
        let filter = PathFilter::new(strings(&["docs"]), Vec::new());
        assert!(filter.accept("src/main.rs"));
        assert!(!filter.is_include_gated());
    }

    #[test]
    fn include_gate_active_with_excludes() {
        let filter = PathFilter::new(strings(&["docs"]), strings(&["docs/private"]));
        assert!(filter.is_include_gated());
        assert!(filter.accept("docs/index.md"));
        assert!(!filter.accept("docs/private/key.pem"));
        assert!(!filter.accept("src/main.rs"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = PathFilter::new(strings(&["a"]), strings(&["a"]));
        assert!(!filter.accept("a/file"));
    }

    #[test]
    fn validated_rejects_absolute_prefix() {
        let result = PathFilter::validated(Vec::new(), strings(&["/etc"]));
        assert!(matches!(result, Err(PathError::AbsoluteNotAllowed(_))));
    }

    #[test]
    fn chain_requires_every_filter() {
        let chain = FilterChain::new()
            .with(PathFilter::excluding(["tmp"]))
            .with(PathFilter::excluding(["cache"]));
        assert!(chain.accept("src/lib.rs"));
        assert!(!chain.accept("tmp/x"));
        assert!(!chain.accept("cache/y"));
    }

    #[test]
    fn chain_drops_empty_filters() {
        let chain = FilterChain::new().with(PathFilter::default());
        assert!(chain.is_empty());
        assert!(chain.accept("anything"));
    }
}
