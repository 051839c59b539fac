// ⚠️ Error taxonomy
// Row-level errors exclude a single record; config errors stop the run before it starts.

use thiserror::Error;

/// Row-local, recoverable errors. The offending row is excluded and counted
/// in the report, the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("Unknown currency: '{currency}' is not in the FX rate table")]
    UnknownCurrency { currency: String },

    #[error("Invalid amount for {field}: {value} is not a finite number")]
    InvalidAmount { field: String, value: f64 },

    #[error("Missing value for {field}")]
    MissingValue { field: String },

    #[error("Unmatched industry: no benchmark for '{industry}'")]
    UnmatchedIndustry { industry: String },

    #[error("Malformed row: {reason}")]
    MalformedRow { reason: String },
}

impl IntegrationError {
    pub fn unknown_currency(currency: &str) -> Self {
        IntegrationError::UnknownCurrency {
            currency: currency.to_string(),
        }
    }

    pub fn invalid_amount(field: &str, value: f64) -> Self {
        IntegrationError::InvalidAmount {
            field: field.to_string(),
            value,
        }
    }

    pub fn missing_value(field: &str) -> Self {
        IntegrationError::MissingValue {
            field: field.to_string(),
        }
    }

    pub fn malformed_row(reason: &str) -> Self {
        IntegrationError::MalformedRow {
            reason: reason.to_string(),
        }
    }

    pub fn unmatched_industry(industry: &str) -> Self {
        IntegrationError::UnmatchedIndustry {
            industry: industry.to_string(),
        }
    }
}

/// Structural errors. These are the only conditions that abort a run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("FX rate table is empty")]
    EmptyRateTable,

    #[error("Invalid FX rate for {currency}: {rate} (must be finite and > 0)")]
    InvalidRate { currency: String, rate: f64 },

    #[error("Invalid margin anomaly bounds: min {min} must be finite and below max {max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
