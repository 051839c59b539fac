// 📈 Metric Calculator
// Derived fields for a joined (company, benchmark) pair:
//
//   ebitda_margin           = ebitda / revenue            (null unless revenue > 0)
//   valuation_vs_sector_avg = multiple - sector multiple
//   margin_vs_sector_avg    = ebitda_margin - sector margin (null if margin is null)
//
// Full precision throughout; rounding belongs to IntegratedRecord::to_row.

use crate::join::JoinedPair;
use crate::records::{DerivedMetrics, IntegratedRecord, RecordMetadata, DEFAULT_DATA_SOURCE};
use chrono::{DateTime, Utc};

pub struct MetricCalculator {
    data_source: String,
    as_of: DateTime<Utc>,
}

impl MetricCalculator {
    pub fn new(data_source: &str, as_of: DateTime<Utc>) -> Self {
        MetricCalculator {
            data_source: data_source.to_string(),
            as_of,
        }
    }

    /// Build the integrated record for one matched pair.
    pub fn compute(&self, pair: &JoinedPair<'_>) -> IntegratedRecord {
        let company = pair.company;
        let benchmark = pair.benchmark;

        let ebitda_margin = ebitda_margin(company.revenue, company.ebitda);
        let derived = DerivedMetrics {
            ebitda_margin,
            valuation_vs_sector_avg: company.valuation_multiple
                - benchmark.average_valuation_multiple,
            margin_vs_sector_avg: ebitda_margin.map(|m| m - benchmark.average_margin),
        };

        IntegratedRecord::assemble(
            company,
            benchmark,
            derived,
            RecordMetadata::new(&self.data_source, self.as_of),
        )
    }

    pub fn compute_all(&self, pairs: &[JoinedPair<'_>]) -> Vec<IntegratedRecord> {
        pairs.iter().map(|pair| self.compute(pair)).collect()
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_SOURCE, Utc::now())
    }
}

/// `ebitda / revenue`, or `None` when revenue is absent or not positive,
/// or when the ratio does not fit in an f64.
pub fn ebitda_margin(revenue: Option<f64>, ebitda: Option<f64>) -> Option<f64> {
    match (revenue, ebitda) {
        (Some(revenue), Some(ebitda)) if revenue > 0.0 => {
            Some(ebitda / revenue).filter(|margin| margin.is_finite())
        }
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
