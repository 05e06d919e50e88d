use std::path::Path;

use anyhow::{Context, Result};
use om_core::AnalysisConfig;

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub block_size: Option<usize>,
    pub min_length: Option<usize>,
    pub limit: Option<usize>,
}

/// Load `path` (or the defaults), apply `overrides` and validate the result.
pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config = AnalysisConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?;
            log::debug!("loaded config from {}", path.display());
            config
        }
        None => AnalysisConfig::default(),
    };

    if let Some(block_size) = overrides.block_size {
        config.entropy_block_size = block_size;
    }
    if let Some(min_length) = overrides.min_length {
        config.min_string_length = min_length;
    }
    if let Some(limit) = overrides.limit {
        config.max_reported_differences = limit;
    }

    config.validate().context("invalid command-line override")?;
    Ok(config)
}
