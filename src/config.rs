// ⚙️ Pipeline configuration (TOML)
//
//   [fx_rates]
//   EUR = 1.07
//   USD = 1.0
//
//   strict_duplicates = false
//   margin_anomaly_bounds = [-5.0, 5.0]
//   industry_match = "exact"        # or "case_insensitive"

use crate::data_quality::DEFAULT_MARGIN_BOUNDS;
use crate::error::ConfigError;
use crate::fx::FxRateTable;
use crate::join::IndustryMatch;
use crate::records::DEFAULT_DATA_SOURCE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub fx_rates: BTreeMap<String, f64>,

    #[serde(default)]
    pub strict_duplicates: bool,

    #[serde(default = "default_margin_bounds")]
    pub margin_anomaly_bounds: (f64, f64),

    #[serde(default)]
    pub industry_match: IndustryMatch,

    #[serde(default = "default_data_source")]
    pub data_source: String,
}

fn default_margin_bounds() -> (f64, f64) {
    DEFAULT_MARGIN_BOUNDS
}

fn default_data_source() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

impl PipelineConfig {
    pub fn new(fx_rates: BTreeMap<String, f64>) -> Self {
        PipelineConfig {
            fx_rates,
            strict_duplicates: false,
            margin_anomaly_bounds: DEFAULT_MARGIN_BOUNDS,
            industry_match: IndustryMatch::default(),
            data_source: default_data_source(),
        }
    }

    /// Static table used when no config file is given.
    pub fn with_default_rates() -> Self {
        let rates = [
            ("EUR", 1.07),
            ("USD", 1.0),
            ("INR", 0.012),
            ("GBP", 1.21),
            ("BRL", 0.20),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        Self::new(rates)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks. Anything that fails here aborts the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_table()?;

        let (min, max) = self.margin_anomaly_bounds;
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ConfigError::InvalidBounds { min, max });
        }

        Ok(())
    }

    pub fn rate_table(&self) -> Result<FxRateTable, ConfigError> {
        FxRateTable::new(self.fx_rates.iter().map(|(code, rate)| (code.as_str(), *rate)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
