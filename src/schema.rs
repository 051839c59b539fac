// 📐 Shape Layer - Schema Harmonization
// Maps each raw source row onto the canonical schema (USD millions, trimmed names)

use crate::error::IntegrationError;
use crate::fx::CurrencyNormalizer;
use crate::records::{BenchmarkRecord, CompanyRecord, HarmonizedBenchmark, HarmonizedCompany};
use crate::report::{Rejection, SourceKind};

/// Accepted rows in input order, plus the rows that were refused.
#[derive(Debug, Clone)]
pub struct HarmonizedBatch<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<Rejection>,
}

// ============================================================================
// SCHEMA HARMONIZER
// ============================================================================

pub struct SchemaHarmonizer {
    normalizer: CurrencyNormalizer,
}

impl SchemaHarmonizer {
    pub fn new(normalizer: CurrencyNormalizer) -> Self {
        SchemaHarmonizer { normalizer }
    }

    /// One company row in, one canonical row (or a rejection) out.
    ///
    /// Absent amounts stay `None`; they are flagged later as missing fields.
    pub fn harmonize_company(
        &self,
        record: &CompanyRecord,
    ) -> Result<HarmonizedCompany, Rejection> {
        let reject = |error: IntegrationError| {
            Rejection::new(SourceKind::Company, record.key(), record.source_line, error)
        };

        // Resolve the currency up front so it is reported even with no amounts
        self.normalizer
            .rates()
            .rate(&record.currency)
            .map_err(reject)?;

        let revenue = self
            .convert(record.revenue_local, &record.currency, "revenue_local")
            .map_err(reject)?;
        let ebitda = self
            .convert(record.ebitda_local, &record.currency, "ebitda_local")
            .map_err(reject)?;
        let valuation_multiple = match record.valuation_multiple {
            Some(value) => self.normalizer.normalize_multiple(value),
            None => Err(IntegrationError::missing_value("valuation_multiple")),
        }
        .map_err(reject)?;

        Ok(HarmonizedCompany {
            company_name: record.company_name.trim().to_string(),
            industry: record.industry.trim().to_string(),
            country: record.country.trim().to_string(),
            fiscal_year: record.fiscal_year,
            revenue,
            ebitda,
            valuation_multiple,
            source_line: record.source_line,
        })
    }

    /// Benchmarks carry no currency; numbers pass through untouched once
    /// they are known to be finite.
    pub fn harmonize_benchmark(
        &self,
        record: &BenchmarkRecord,
    ) -> Result<HarmonizedBenchmark, Rejection> {
        let checks = [
            ("average_margin", record.average_margin),
            ("sector_growth_rate", record.sector_growth_rate),
            ("average_valuation_multiple", record.average_valuation_multiple),
            ("market_size_billions", record.market_size_billions),
        ];

        if let Some((field, value)) = checks.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Rejection::new(
                SourceKind::Benchmark,
                record.key(),
                record.source_line,
                IntegrationError::invalid_amount(field, *value),
            ));
        }

        Ok(HarmonizedBenchmark {
            industry: record.industry.clone(),
            average_margin: record.average_margin,
            sector_growth_rate: record.sector_growth_rate,
            average_valuation_multiple: record.average_valuation_multiple,
            market_size_billions: record.market_size_billions,
            source_line: record.source_line,
        })
    }

    pub fn harmonize_companies(&self, records: &[CompanyRecord]) -> HarmonizedBatch<HarmonizedCompany> {
        let mut accepted = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for record in records {
            match self.harmonize_company(record) {
                Ok(company) => accepted.push(company),
                Err(rejection) => rejected.push(rejection),
            }
        }

        HarmonizedBatch { accepted, rejected }
    }

    pub fn harmonize_benchmarks(
        &self,
        records: &[BenchmarkRecord],
    ) -> HarmonizedBatch<HarmonizedBenchmark> {
        let mut accepted = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for record in records {
            match self.harmonize_benchmark(record) {
                Ok(benchmark) => accepted.push(benchmark),
                Err(rejection) => rejected.push(rejection),
            }
        }

        HarmonizedBatch { accepted, rejected }
    }

    fn convert(
        &self,
        amount: Option<f64>,
        currency: &str,
        field: &str,
    ) -> Result<Option<f64>, IntegrationError> {
        match amount {
            None => Ok(None),
            Some(value) if !value.is_finite() => {
                Err(IntegrationError::invalid_amount(field, value))
            }
            Some(value) => self
                .normalizer
                .to_usd_millions(value, currency)
                .map(Some)
                .map_err(|err| match err {
                    IntegrationError::InvalidAmount { value, .. } => {
                        IntegrationError::invalid_amount(field, value)
                    }
                    other => other,
                }),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::FxRateTable;
    use std::sync::Arc;

    fn create_test_harmonizer() -> SchemaHarmonizer {
        let table = FxRateTable::new(vec![("EUR", 1.07), ("USD", 1.0), ("INR", 0.012)]).unwrap();
        SchemaHarmonizer::new(CurrencyNormalizer::new(Arc::new(table)))
    }

    fn create_test_company() -> CompanyRecord {
        CompanyRecord::new("  Acme ", "Tech", "Germany", "EUR", 100.0, 20.0, 8.5, 2024)
            .with_source_line(2)
    }

    #[test]
    fn test_harmonize_company_converts_to_usd() {
        let harmonizer = create_test_harmonizer();
        let company = harmonizer.harmonize_company(&create_test_company()).unwrap();

        assert_eq!(company.company_name, "Acme");
        assert!((company.revenue.unwrap() - 107.0).abs() < 1e-9);
        assert!((company.ebitda.unwrap() - 21.4).abs() < 1e-9);
        assert_eq!(company.valuation_multiple, 8.5);
        assert_eq!(company.source_line, Some(2));
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let harmonizer = create_test_harmonizer();
        let mut record = create_test_company();
        record.currency = "XYZ".to_string();

        let rejection = harmonizer.harmonize_company(&record).unwrap_err();
        assert_eq!(rejection.error, IntegrationError::unknown_currency("XYZ"));
        assert_eq!(rejection.source, SourceKind::Company);
        assert_eq!(rejection.source_line, Some(2));
    }

    #[test]
    fn test_unknown_currency_reported_without_amounts() {
        let harmonizer = create_test_harmonizer();
        let mut record = create_test_company();
        record.currency = "XYZ".to_string();
        record.revenue_local = None;
        record.ebitda_local = None;

        assert!(matches!(
            harmonizer.harmonize_company(&record),
            Err(Rejection {
                error: IntegrationError::UnknownCurrency { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_amount_rejected_not_zeroed() {
        let harmonizer = create_test_harmonizer();
        let mut record = create_test_company();
        record.ebitda_local = Some(f64::NAN);

        let rejection = harmonizer.harmonize_company(&record).unwrap_err();
        match rejection.error {
            IntegrationError::InvalidAmount { field, .. } => assert_eq!(field, "ebitda_local"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_absent_amount_kept_as_none() {
        let harmonizer = create_test_harmonizer();
        let mut record = create_test_company();
        record.revenue_local = None;

        let company = harmonizer.harmonize_company(&record).unwrap();
        assert_eq!(company.revenue, None);
        assert!(company.ebitda.is_some());
    }

    #[test]
    fn test_harmonize_benchmark_passes_values_through() {
        let harmonizer = create_test_harmonizer();
        let record = BenchmarkRecord::new("Tech", 0.183333, 0.12, 9.0, 50.0);

        let benchmark = harmonizer.harmonize_benchmark(&record).unwrap();
        assert_eq!(benchmark.average_margin, 0.183333);
        assert_eq!(benchmark.average_valuation_multiple, 9.0);
    }

    #[test]
    fn test_harmonize_benchmark_rejects_infinite() {
        let harmonizer = create_test_harmonizer();
        let record = BenchmarkRecord::new("Tech", 0.18, f64::INFINITY, 9.0, 50.0);

        let rejection = harmonizer.harmonize_benchmark(&record).unwrap_err();
        assert_eq!(rejection.source, SourceKind::Benchmark);
        assert!(matches!(rejection.error, IntegrationError::InvalidAmount { .. }));
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let harmonizer = create_test_harmonizer();
        let records = vec![
            CompanyRecord::new("A", "Tech", "USA", "USD", 10.0, 1.0, 5.0, 2024),
            CompanyRecord::new("B", "Tech", "Mars", "XYZ", 10.0, 1.0, 5.0, 2024),
            CompanyRecord::new("C", "Tech", "India", "INR", 1000.0, 100.0, 5.0, 2024),
        ];

        let batch = harmonizer.harmonize_companies(&records);
        let names: Vec<&str> = batch.accepted.iter().map(|c| c.company_name.as_str()).collect();

        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].row_key.to_string(), "B/2024");
    }

    #[test]
    fn test_overflowing_amount_names_its_field() {
        let harmonizer = create_test_harmonizer();
        let mut record = create_test_company();
        record.revenue_local = Some(1.7e308);

        let rejection = harmonizer.harmonize_company(&record).unwrap_err();
        assert!(matches!(
            rejection.error,
            IntegrationError::InvalidAmount { ref field, .. } if field == "revenue_local"
        ));
    }

    #[test]
    fn test_missing_multiple_rejected() {
        let harmonizer = create_test_harmonizer();
        let mut record = create_test_company();
        record.valuation_multiple = None;

        let rejection = harmonizer.harmonize_company(&record).unwrap_err();
        assert_eq!(
            rejection.error,
            IntegrationError::missing_value("valuation_multiple")
        );
    }
}
