//! Resolver configuration

use crate::ResolverError;
use serde::{Deserialize, Serialize};

/// Default trigram similarity threshold (pg_trgm's own default)
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Configuration for duplicate matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// A stored record scoring strictly above this is a close match
    pub similarity_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    /// Check the threshold is a usable similarity
    pub fn validate(&self) -> Result<(), ResolverError> {
        if !(0.0..1.0).contains(&self.similarity_threshold) {
            return Err(ResolverError::Config(format!(
                "similarity_threshold must be in [0, 1), got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}
