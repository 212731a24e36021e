// src/config.rs

use crate::types::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::warn;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    /// A malformed file is still an error; silently ignoring it would hide
    /// typos in tuned thresholds.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            warn!("config file {} not found, using built-in defaults", path);
            Ok(Self::default())
        }
    }

    /// Env-filter directive for the tracing subscriber.
    pub fn log_filter(&self) -> String {
        format!("sightguard={}", self.logging.level)
    }
}
