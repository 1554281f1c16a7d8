//! Text acquisition settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[acquisition]` section of the application config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Page fetch timeout (seconds)
    pub fetch_timeout_secs: u64,

    /// Most concealed page elements (collapsed blocks, toggle targets,
    /// closed `<details>`) whose text is included
    pub max_reveal_elements: usize,

    /// User-Agent sent when fetching pages
    pub user_agent: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 60,
            max_reveal_elements: 50,
            user_agent: concat!("annuaire/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AcquisitionConfig {
    /// Fetch timeout as a Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_timeout_secs == 0 {
            return Err("fetch_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
