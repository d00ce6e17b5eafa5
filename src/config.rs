//! Resolver configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KronikaResult, SourceError, ValidationError};

/// Tunables for index building and name resolution.
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
///
/// # Examples
///
/// ```
/// use kronika::ResolverConfig;
///
/// let config = ResolverConfig::from_json_str(r#"{"min_token_len": 4}"#).unwrap();
/// assert_eq!(config.min_token_len, 4);
/// assert_eq!(config.distance_divisor, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Words of a multi-word name shorter than this are not indexed.
    pub min_token_len: usize,
    /// Declension and alternation never leave a stem shorter than this.
    pub min_stem_len: usize,
    /// Queries shorter than this use `short_query_max_distance`.
    pub short_query_len: usize,
    /// Edit budget for short queries.
    pub short_query_max_distance: usize,
    /// Longer queries allow `len / distance_divisor` edits.
    pub distance_divisor: usize,
    /// Build a BK-tree for approximate lookup instead of scanning the index.
    pub use_search_tree: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            min_stem_len: 3,
            short_query_len: 5,
            short_query_max_distance: 1,
            distance_divisor: 3,
            use_search_tree: true,
        }
    }
}

impl ResolverConfig {
    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed JSON and a validation error for
    /// out-of-range values.
    pub fn from_json_str(json: &str) -> KronikaResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| SourceError::Decode {
            source_name: "resolver config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` if the file cannot be read, plus the errors
    /// of [`ResolverConfig::from_json_str`].
    pub fn from_path(path: &Path) -> KronikaResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.distance_divisor == 0 {
            return Err(ValidationError::InvalidConfig {
                field: "distance_divisor".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_stem_len == 0 {
            return Err(ValidationError::InvalidConfig {
                field: "min_stem_len".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Edit-distance budget for a query of `len` characters.
    #[must_use]
    pub fn max_distance_for(&self, len: usize) -> usize {
        if len < self.short_query_len {
            self.short_query_max_distance
        } else {
            len / self.distance_divisor.max(1)
        }
    }
}
