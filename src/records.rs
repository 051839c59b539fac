// 📦 Record types
// Raw inputs (one per source row) → harmonized records → IntegratedRecord

use crate::fx::round2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TARGET_CURRENCY: &str = "USD";
pub const TARGET_UNITS: &str = "millions";
pub const DEFAULT_DATA_SOURCE: &str = "Integrated_Private_and_Benchmark";

// ============================================================================
// RAW INPUTS (read-only for the engine)
// ============================================================================

/// One private-market transaction row, amounts in millions of `currency`.
///
/// Empty amount or year cells deserialize to `None` so they can be reported
/// as missing instead of being read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub industry: String,
    pub country: String,
    pub currency: String,
    pub revenue_local: Option<f64>,
    pub ebitda_local: Option<f64>,
    pub valuation_multiple: Option<f64>,
    pub fiscal_year: Option<i32>,

    /// Line in the source file (header = line 1), when read from a file
    #[serde(skip)]
    pub source_line: Option<usize>,
}

impl CompanyRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        company_name: &str,
        industry: &str,
        country: &str,
        currency: &str,
        revenue_local: f64,
        ebitda_local: f64,
        valuation_multiple: f64,
        fiscal_year: i32,
    ) -> Self {
        CompanyRecord {
            company_name: company_name.to_string(),
            industry: industry.to_string(),
            country: country.to_string(),
            currency: currency.to_string(),
            revenue_local: Some(revenue_local),
            ebitda_local: Some(ebitda_local),
            valuation_multiple: Some(valuation_multiple),
            fiscal_year: Some(fiscal_year),
            source_line: None,
        }
    }

    /// Builder: attach source line provenance
    pub fn with_source_line(mut self, line: usize) -> Self {
        self.source_line = Some(line);
        self
    }

    pub fn key(&self) -> RowKey {
        RowKey::Company {
            company_name: self.company_name.trim().to_string(),
            fiscal_year: self.fiscal_year,
        }
    }
}

/// Industry-level benchmark statistics. Margins and growth are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub industry: String,
    pub average_margin: f64,
    pub sector_growth_rate: f64,
    pub average_valuation_multiple: f64,
    pub market_size_billions: f64,

    #[serde(skip)]
    pub source_line: Option<usize>,
}

impl BenchmarkRecord {
    pub fn new(
        industry: &str,
        average_margin: f64,
        sector_growth_rate: f64,
        average_valuation_multiple: f64,
        market_size_billions: f64,
    ) -> Self {
        BenchmarkRecord {
            industry: industry.to_string(),
            average_margin,
            sector_growth_rate,
            average_valuation_multiple,
            market_size_billions,
            source_line: None,
        }
    }

    pub fn with_source_line(mut self, line: usize) -> Self {
        self.source_line = Some(line);
        self
    }

    pub fn key(&self) -> RowKey {
        RowKey::Benchmark {
            industry: self.industry.clone(),
        }
    }
}

// ============================================================================
// HARMONIZED (canonical) RECORDS
// ============================================================================

/// Company row in the canonical schema: USD millions, trimmed identity fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonizedCompany {
    pub company_name: String,
    pub industry: String,
    pub country: String,
    pub fiscal_year: Option<i32>,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub valuation_multiple: f64,
    pub source_line: Option<usize>,
}

impl HarmonizedCompany {
    pub fn key(&self) -> RowKey {
        RowKey::Company {
            company_name: self.company_name.clone(),
            fiscal_year: self.fiscal_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonizedBenchmark {
    pub industry: String,
    pub average_margin: f64,
    pub sector_growth_rate: f64,
    pub average_valuation_multiple: f64,
    pub market_size_billions: f64,
    pub source_line: Option<usize>,
}

// ============================================================================
// INTEGRATED RECORD (immutable once built)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetadata {
    pub data_source: String,
    pub currency: String,
    pub units: String,
    pub last_updated: DateTime<Utc>,
}

impl RecordMetadata {
    pub fn new(data_source: &str, last_updated: DateTime<Utc>) -> Self {
        RecordMetadata {
            data_source: data_source.to_string(),
            currency: TARGET_CURRENCY.to_string(),
            units: TARGET_UNITS.to_string(),
            last_updated,
        }
    }
}

/// One company joined with its industry benchmark, plus derived metrics.
///
/// Built only by `MetricCalculator`; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegratedRecord {
    company_name: String,
    industry: String,
    country: String,
    fiscal_year: Option<i32>,
    revenue: Option<f64>,
    ebitda: Option<f64>,
    ebitda_margin: Option<f64>,
    valuation_multiple: f64,
    average_margin: f64,
    sector_growth_rate: f64,
    average_valuation_multiple: f64,
    market_size_billions: f64,
    valuation_vs_sector_avg: f64,
    margin_vs_sector_avg: Option<f64>,
    metadata: RecordMetadata,
}

/// Derived values handed to `IntegratedRecord::assemble`.
pub(crate) struct DerivedMetrics {
    pub ebitda_margin: Option<f64>,
    pub valuation_vs_sector_avg: f64,
    pub margin_vs_sector_avg: Option<f64>,
}

impl IntegratedRecord {
    pub(crate) fn assemble(
        company: &HarmonizedCompany,
        benchmark: &HarmonizedBenchmark,
        derived: DerivedMetrics,
        metadata: RecordMetadata,
    ) -> Self {
        IntegratedRecord {
            company_name: company.company_name.clone(),
            industry: company.industry.clone(),
            country: company.country.clone(),
            fiscal_year: company.fiscal_year,
            revenue: company.revenue,
            ebitda: company.ebitda,
            ebitda_margin: derived.ebitda_margin,
            valuation_multiple: company.valuation_multiple,
            average_margin: benchmark.average_margin,
            sector_growth_rate: benchmark.sector_growth_rate,
            average_valuation_multiple: benchmark.average_valuation_multiple,
            market_size_billions: benchmark.market_size_billions,
            valuation_vs_sector_avg: derived.valuation_vs_sector_avg,
            margin_vs_sector_avg: derived.margin_vs_sector_avg,
            metadata,
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn fiscal_year(&self) -> Option<i32> {
        self.fiscal_year
    }

    /// Revenue in USD millions
    pub fn revenue(&self) -> Option<f64> {
        self.revenue
    }

    /// EBITDA in USD millions
    pub fn ebitda(&self) -> Option<f64> {
        self.ebitda
    }

    pub fn ebitda_margin(&self) -> Option<f64> {
        self.ebitda_margin
    }

    pub fn valuation_multiple(&self) -> f64 {
        self.valuation_multiple
    }

    pub fn average_margin(&self) -> f64 {
        self.average_margin
    }

    pub fn sector_growth_rate(&self) -> f64 {
        self.sector_growth_rate
    }

    pub fn average_valuation_multiple(&self) -> f64 {
        self.average_valuation_multiple
    }

    pub fn market_size_billions(&self) -> f64 {
        self.market_size_billions
    }

    pub fn valuation_vs_sector_avg(&self) -> f64 {
        self.valuation_vs_sector_avg
    }

    pub fn margin_vs_sector_avg(&self) -> Option<f64> {
        self.margin_vs_sector_avg
    }

    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub fn key(&self) -> RowKey {
        RowKey::Company {
            company_name: self.company_name.clone(),
            fiscal_year: self.fiscal_year,
        }
    }

    /// Presentation copy with derived decimals rounded to 2 places.
    pub fn to_row(&self) -> IntegratedRow {
        IntegratedRow {
            company_name: self.company_name.clone(),
            industry: self.industry.clone(),
            country: self.country.clone(),
            fiscal_year: self.fiscal_year,
            revenue: self.revenue.map(round2),
            ebitda: self.ebitda.map(round2),
            ebitda_margin: self.ebitda_margin.map(round2),
            valuation_multiple: round2(self.valuation_multiple),
            average_margin: round2(self.average_margin),
            sector_growth_rate: round2(self.sector_growth_rate),
            average_valuation_multiple: round2(self.average_valuation_multiple),
            market_size_billions: round2(self.market_size_billions),
            valuation_vs_sector_avg: round2(self.valuation_vs_sector_avg),
            margin_vs_sector_avg: self.margin_vs_sector_avg.map(round2),
            data_source: self.metadata.data_source.clone(),
            currency: self.metadata.currency.clone(),
            units: self.metadata.units.clone(),
            last_updated: self
                .metadata
                .last_updated
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }
}

/// Output shape of an integrated record (one CSV row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedRow {
    pub company_name: String,
    pub industry: String,
    pub country: String,
    pub fiscal_year: Option<i32>,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub valuation_multiple: f64,
    pub average_margin: f64,
    pub sector_growth_rate: f64,
    pub average_valuation_multiple: f64,
    pub market_size_billions: f64,
    pub valuation_vs_sector_avg: f64,
    pub margin_vs_sector_avg: Option<f64>,
    pub data_source: String,
    pub currency: String,
    pub units: String,
    pub last_updated: String,
}

// ============================================================================
// ROW KEYS (for reports)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKey {
    Company {
        company_name: String,
        fiscal_year: Option<i32>,
    },
    Benchmark {
        industry: String,
    },
    /// A source row too malformed to name
    SourceLine {
        line: usize,
    },
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Company {
                company_name,
                fiscal_year: Some(year),
            } => write!(f, "{}/{}", company_name, year),
            RowKey::Company {
                company_name,
                fiscal_year: None,
            } => write!(f, "{}/?", company_name),
            RowKey::Benchmark { industry } => write!(f, "benchmark:{}", industry),
            RowKey::SourceLine { line } => write!(f, "line:{}", line),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
