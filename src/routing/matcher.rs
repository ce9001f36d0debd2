//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive)
//! - Enforce the segment boundary after the prefix
//! - Hand back the unmatched remainder for path rewriting
//!
//! # Design Decisions
//! - Plain string comparison, no regex
//! - `/api/users` matches `/api/users` and `/api/users/...`, never `/api/usersX`

/// Matches the request path against a mount prefix.
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

    /// Returns true if `path` lies under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.remainder(path).is_some()
    }

    /// The part of `path` after the prefix, when the prefix matches on a
    /// segment boundary. The remainder is empty or starts with `/`.
    pub fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
