//! Invalidation Patterns
//!
//! Describes which keys an `invalidate` call targets and whether the prefix
//! index can narrow the candidate set.

use std::fmt;

use regex::Regex;

use crate::cache::{key_prefix, KEY_DELIMITER};
use crate::error::{CacheError, Result};

/// Characters with special meaning in a regex; a prefix containing any of
/// them cannot be treated as a literal.
const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$', '#', '&', '-', '~',
];

// == Invalidation Pattern ==
/// Selects the keys removed by an invalidation.
#[derive(Debug, Clone)]
pub enum InvalidationPattern {
    /// Exactly this key.
    Exact(String),
    /// Every key in the namespace, i.e. starting with `<prefix>:`.
    Prefix(String),
    /// Every key matched by the regex.
    Regex(Regex),
}

impl InvalidationPattern {
    /// Compiles `pattern` as a regex. Malformed patterns are rejected.
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| CacheError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    // == Matches ==
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(exact) => key == exact,
            Self::Prefix(prefix) => key
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with(KEY_DELIMITER)),
            Self::Regex(regex) => regex.is_match(key),
        }
    }

    // == Indexed Prefix ==
    /// Returns the prefix bucket that holds every stored key this pattern
    /// can match, or `None` if the whole store has to be scanned.
    ///
    /// A regex qualifies when it is anchored with `^`, followed by literal
    /// text up to the first `:`, and contains no alternation.
    pub fn indexed_prefix(&self) -> Option<&str> {
        match self {
            Self::Exact(key) => Some(key_prefix(key)),
            Self::Prefix(prefix) => Some(prefix),
            Self::Regex(regex) => literal_prefix(regex.as_str()),
        }
    }
}

fn literal_prefix(pattern: &str) -> Option<&str> {
    if pattern.contains('|') {
        return None;
    }
    let body = pattern.strip_prefix('^')?;
    let (head, rest) = body.split_once(KEY_DELIMITER)?;
    if head.contains(REGEX_META) {
        return None;
    }
    // `^board:?` would also match `boardroom`, which lives in another bucket
    if rest.starts_with(['?', '*', '{']) {
        return None;
    }
    Some(head)
}

impl From<&str> for InvalidationPattern {
    fn from(key: &str) -> Self {
        Self::Exact(key.to_string())
    }
}

impl From<String> for InvalidationPattern {
    fn from(key: String) -> Self {
        Self::Exact(key)
    }
}

impl From<Regex> for InvalidationPattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

impl From<&InvalidationPattern> for InvalidationPattern {
    fn from(pattern: &InvalidationPattern) -> Self {
        pattern.clone()
    }
}

impl fmt::Display for InvalidationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "{key}"),
            Self::Prefix(prefix) => write!(f, "{prefix}{KEY_DELIMITER}*"),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}
