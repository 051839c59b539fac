// 💱 FX Rate Table + Currency Normalizer
// Converts local-currency amounts (already in millions) to USD millions.
//
//   usd_millions = amount_local × rate(currency)
//
// The table is built once from configuration and shared read-only.

use crate::error::{ConfigError, IntegrationError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// FX RATE TABLE
// ============================================================================

/// Static currency → USD-per-unit mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct FxRateTable {
    rates: BTreeMap<String, f64>,
}

impl FxRateTable {
    /// Build a table from (code, factor) pairs.
    ///
    /// Codes are trimmed and upper-cased. Every factor must be finite and > 0.
    pub fn new<I, S>(rates: I) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = BTreeMap::new();

        for (code, rate) in rates {
            let code = normalize_code(code.as_ref());
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConfigError::InvalidRate {
                    currency: code,
                    rate,
                });
            }
            table.insert(code, rate);
        }

        if table.is_empty() {
            return Err(ConfigError::EmptyRateTable);
        }

        Ok(FxRateTable { rates: table })
    }

    /// USD-per-unit factor for `currency`. Never defaults.
    pub fn rate(&self, currency: &str) -> Result<f64> {
        self.rates
            .get(&normalize_code(currency))
            .copied()
            .ok_or_else(|| IntegrationError::unknown_currency(currency))
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.rates.contains_key(&normalize_code(currency))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Known currency codes, sorted.
    pub fn currencies(&self) -> Vec<&str> {
        self.rates.keys().map(String::as_str).collect()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

// ============================================================================
// CURRENCY NORMALIZER
// ============================================================================

pub struct CurrencyNormalizer {
    rates: Arc<FxRateTable>,
}

impl CurrencyNormalizer {
    pub fn new(rates: Arc<FxRateTable>) -> Self {
        CurrencyNormalizer { rates }
    }

    pub fn rates(&self) -> &FxRateTable {
        &self.rates
    }

    /// Convert an amount in millions of `currency` to USD millions.
    ///
    /// Full precision is kept; rounding happens at the output boundary.
    /// A product that overflows to infinity is an invalid amount.
    pub fn to_usd_millions(&self, amount_local: f64, currency: &str) -> Result<f64> {
        if !amount_local.is_finite() {
            return Err(IntegrationError::invalid_amount("amount", amount_local));
        }
        let rate = self.rates.rate(currency)?;
        let converted = amount_local * rate;
        if !converted.is_finite() {
            return Err(IntegrationError::invalid_amount("amount", converted));
        }
        Ok(converted)
    }

    /// Multiples are the one value rounded at normalization time (2 places).
    pub fn normalize_multiple(&self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(IntegrationError::invalid_amount("valuation_multiple", value));
        }
        Ok(round2(value))
    }
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
