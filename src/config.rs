// src/config.rs

//! Configuration loading utilities.
//!
//! This module provides convenience functions for loading the
//! harvester configuration from files.

use std::path::Path;

use crate::error::Result;
use crate::models::HarvestConfig;

/// Load configuration from a TOML file.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Result<HarvestConfig> {
    HarvestConfig::load(path).or_else(|e| {
        log::warn!("Failed to load config from {path:?}: {e}");
        log::warn!("Using default configuration.");
        Ok(HarvestConfig::default())
    })
}

/// Load and validate configuration.
pub fn load_validated(path: &Path) -> Result<HarvestConfig> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/harvester.toml")).unwrap();
        assert_eq!(config.retry.max_retries, 5);
    }

    #[test]
    fn load_validated_accepts_defaults() {
        assert!(load_validated(Path::new("/nonexistent/harvester.toml")).is_ok());
    }
}
