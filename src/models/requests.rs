//! Request DTOs for the diagnostics API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::InvalidationPattern;
use crate::error::{CacheError, Result};

/// Request body for POST /invalidate
///
/// # Fields
/// - `pattern`: exact key, or a regex when `regex` is true
/// - `regex`: interpret `pattern` as a regular expression
/// - `cache`: restrict to one named cache (all caches if omitted)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub cache: Option<String>,
}

impl InvalidateRequest {
    /// Validates the request and builds the pattern it describes.
    pub fn to_pattern(&self) -> Result<InvalidationPattern> {
        if self.pattern.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Pattern cannot be empty".to_string(),
            ));
        }
        if self.regex {
            InvalidationPattern::regex(&self.pattern)
        } else {
            Ok(InvalidationPattern::from(self.pattern.as_str()))
        }
    }
}
