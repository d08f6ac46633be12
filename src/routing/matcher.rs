//! Route matching logic.
//!
//! # Design Decisions
//! - Path matching is case-sensitive and purely textual
//! - No segment alignment: `/volunter` also claims `/volunteers`
//! - Specificity is the prefix length, used to order overlapping rules

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;

    /// Higher values are evaluated first.
    fn specificity(&self) -> usize;
}

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        !self.prefix.is_empty() && path.starts_with(&self.prefix)
    }

    fn specificity(&self) -> usize {
        self.prefix.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/village");

        assert!(matcher.matches("/village"));
        assert!(matcher.matches("/village/123"));
        assert!(matcher.matches("/villages"));
        assert!(!matcher.matches("/Village/123"));
        assert!(!matcher.matches("/smartvillage"));
        assert!(!matcher.matches("/"));
    }

    #[test]
    fn test_trailing_slash_prefix() {
        let matcher = PathPrefixMatcher::new("/participations/");

        assert!(matcher.matches("/participations/42"));
        assert!(!matcher.matches("/participations"));
    }

    #[test]
    fn test_empty_prefix_never_matches() {
        let matcher = PathPrefixMatcher::new("");
        assert!(!matcher.matches("/anything"));
        assert_eq!(matcher.specificity(), 0);
    }
}
