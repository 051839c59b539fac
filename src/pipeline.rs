// 🔄 Integration Pipeline
// raw companies + raw benchmarks
//   → SchemaHarmonizer (each source independently)
//   → IntegrationJoiner
//   → MetricCalculator
//   → DataQualityValidator
//   → integrated dataset + report
//
// Never fails for data reasons. Only a bad configuration stops it, and that
// happens in `new`, before any row is touched.

use crate::config::PipelineConfig;
use crate::data_quality::DataQualityValidator;
use crate::error::ConfigError;
use crate::fx::CurrencyNormalizer;
use crate::join::IntegrationJoiner;
use crate::metrics::MetricCalculator;
use crate::records::{BenchmarkRecord, CompanyRecord, IntegratedRecord};
use crate::parser::ParsedSource;
use crate::report::{IntegrationReport, Rejection, SourceKind};
use crate::schema::SchemaHarmonizer;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<IntegratedRecord>,
    pub report: IntegrationReport,
}

pub struct IntegrationPipeline {
    config: PipelineConfig,
    harmonizer: SchemaHarmonizer,
    joiner: IntegrationJoiner,
    validator: DataQualityValidator,
}

impl IntegrationPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rates = Arc::new(config.rate_table()?);

        Ok(IntegrationPipeline {
            harmonizer: SchemaHarmonizer::new(CurrencyNormalizer::new(rates)),
            joiner: IntegrationJoiner::new(config.industry_match),
            validator: DataQualityValidator::with_settings(
                config.strict_duplicates,
                config.margin_anomaly_bounds,
            ),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run with `last_updated` stamped as now.
    pub fn run(&self, companies: &[CompanyRecord], benchmarks: &[BenchmarkRecord]) -> PipelineOutput {
        self.run_at(companies, benchmarks, Utc::now())
    }

    /// Run with a fixed timestamp. Identical inputs give identical output.
    pub fn run_at(
        &self,
        companies: &[CompanyRecord],
        benchmarks: &[BenchmarkRecord],
        as_of: DateTime<Utc>,
    ) -> PipelineOutput {
        self.execute(companies, benchmarks, &[], as_of)
    }

    /// Run on parsed files. Rows the parser refused are reported as excluded.
    pub fn run_sources(
        &self,
        companies: &ParsedSource<CompanyRecord>,
        benchmarks: &ParsedSource<BenchmarkRecord>,
    ) -> PipelineOutput {
        self.run_sources_at(companies, benchmarks, Utc::now())
    }

    pub fn run_sources_at(
        &self,
        companies: &ParsedSource<CompanyRecord>,
        benchmarks: &ParsedSource<BenchmarkRecord>,
        as_of: DateTime<Utc>,
    ) -> PipelineOutput {
        let refused: Vec<Rejection> = companies
            .rejected
            .iter()
            .chain(&benchmarks.rejected)
            .cloned()
            .collect();
        self.execute(&companies.records, &benchmarks.records, &refused, as_of)
    }

    fn execute(
        &self,
        companies: &[CompanyRecord],
        benchmarks: &[BenchmarkRecord],
        refused: &[Rejection],
        as_of: DateTime<Utc>,
    ) -> PipelineOutput {
        let refused_companies = refused
            .iter()
            .filter(|r| r.source == SourceKind::Company)
            .count();
        let total_companies = companies.len() + refused_companies;
        let total_benchmarks = benchmarks.len() + refused.len() - refused_companies;

        info!(
            companies = total_companies,
            benchmarks = total_benchmarks,
            "Starting integration run"
        );
        let mut report = IntegrationReport::new(total_companies, total_benchmarks);
        report.strict_duplicates = self.config.strict_duplicates;

        for rejection in refused {
            warn!(row = %rejection.row_key, error = %rejection.error, "Row refused by parser");
            report.record_rejection(rejection);
        }

        // 1. Harmonize both sources
        let company_batch = self.harmonizer.harmonize_companies(companies);
        let benchmark_batch = self.harmonizer.harmonize_benchmarks(benchmarks);
        debug!(
            accepted_companies = company_batch.accepted.len(),
            accepted_benchmarks = benchmark_batch.accepted.len(),
            "Harmonized sources"
        );
        for rejection in company_batch.rejected.iter().chain(&benchmark_batch.rejected) {
            warn!(row = %rejection.row_key, error = %rejection.error, "Row rejected");
            report.record_rejection(rejection);
        }

        // 2. Join on industry
        let joined = self
            .joiner
            .join(&company_batch.accepted, &benchmark_batch.accepted);
        for finding in joined.warnings {
            warn!(row = %finding.row_key, "{}", finding.message);
            report.record(finding);
        }
        for rejection in &joined.unmatched {
            warn!(row = %rejection.row_key, error = %rejection.error, "Row excluded");
            report.record_rejection(rejection);
        }

        // 3. Derived metrics
        let calculator = MetricCalculator::new(&self.config.data_source, as_of);
        let records = calculator.compute_all(&joined.matched);
        debug!(records = records.len(), "Computed derived metrics");

        // 4. Strict mode collapses duplicates first; report row indices
        //    always refer to the final dataset
        let before = records.len();
        let (records, collapsed) = self.validator.apply_strict(records);
        let dropped = before - records.len();
        if dropped > 0 {
            info!(dropped, "Strict mode dropped later duplicates");
        }

        // 5. Audit the final set
        let audit = self.validator.audit(&records);
        for finding in audit.findings.into_iter().chain(collapsed) {
            report.record(finding);
        }
        report.completeness_score = audit.completeness_score;
        report.negative_ebitda_rows = audit.negative_ebitda_rows;

        report.dropped_duplicates = dropped;
        report.integrated_records = records.len();
        report.dataset_fingerprint = fingerprint(&records);

        info!("{}", report.summary());

        PipelineOutput { records, report }
    }
}

/// SHA-256 over the `Debug` rendering of each record, one line per record.
///
/// Every value is hashed at full precision, non-finite numbers included.
pub fn fingerprint(records: &[IntegratedRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(format!("{:?}", record).as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
