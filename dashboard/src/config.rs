//! Configuration management

use fleetdash_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default refresh period for both table views, in seconds
pub const DEFAULT_REFRESH_SECS: u64 = 5;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base origin of the backend API
    pub base_url: String,

    /// Refresh period for the two table views
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

impl Config {
    /// Load configuration from file or environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            Self::load_from_file(p)
        } else {
            Self::load_from_env()
        }
    }

    /// Load from configuration file
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    fn load_from_env() -> Result<Self> {
        let base_url = std::env::var("FLEETDASH_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let refresh_secs = std::env::var("FLEETDASH_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_SECS);

        Ok(Config {
            base_url,
            refresh_secs,
        })
    }
}
