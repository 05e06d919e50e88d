//! Tunables shared by the engines and the analyzer.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Analysis parameters. Every field has a default, so a partial JSON
/// document (or `{}`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Bytes per entropy block.
    pub entropy_block_size: usize,
    pub min_string_length: usize,
    /// Leading bytes used for type detection and the signature hex.
    pub signature_window: usize,
    /// Leading bytes summarised by the entropy verdict.
    pub metadata_sample_size: usize,
    pub max_reported_differences: usize,
    /// Columns of the byte heatmap.
    pub heatmap_width: usize,
    /// Extracted strings kept verbatim in a report.
    pub sample_strings: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            entropy_block_size: crate::entropy::DEFAULT_BLOCK_SIZE,
            min_string_length: crate::strings::DEFAULT_MIN_LENGTH,
            signature_window: crate::signatures::SAMPLE_WINDOW,
            metadata_sample_size: 8192,
            max_reported_differences: 1000,
            heatmap_width: 64,
            sample_strings: 50,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make an engine produce nothing.
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("entropyBlockSize", self.entropy_block_size),
            ("minStringLength", self.min_string_length),
            ("signatureWindow", self.signature_window),
            ("heatmapWidth", self.heatmap_width),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}
