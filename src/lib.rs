// Valuation Data Integration - Core Library
// Exposes the integration engine plus its file and CLI collaborators

pub mod error;
pub mod fx;             // FX rate table + currency normalizer
pub mod records;        // Raw, harmonized and integrated record types
pub mod report;         // Findings, categories, integration report
pub mod schema;         // Schema harmonizer
pub mod join;           // Industry joiner
pub mod metrics;        // Derived metrics
pub mod data_quality;   // Set-level validator
pub mod config;
pub mod pipeline;
pub mod parser;         // CSV source parsers
pub mod export;         // CSV / JSON writers
pub mod sample;         // Seeded sample inputs
pub mod logging;

// Re-export commonly used types
pub use error::{ConfigError, IntegrationError};
pub use fx::{CurrencyNormalizer, FxRateTable};
pub use records::{
    BenchmarkRecord, CompanyRecord, HarmonizedBenchmark, HarmonizedCompany,
    IntegratedRecord, IntegratedRow, RecordMetadata, RowKey,
};
pub use report::{
    Finding, IntegrationReport, IssueCategory, Rejection, Severity, SourceKind,
};
pub use schema::{HarmonizedBatch, SchemaHarmonizer};
pub use join::{IndustryMatch, IntegrationJoiner, JoinResult, JoinedPair};
pub use metrics::MetricCalculator;
pub use data_quality::{DataQualityValidator, QualityAudit, DEFAULT_MARGIN_BOUNDS};
pub use config::PipelineConfig;
pub use pipeline::{IntegrationPipeline, PipelineOutput};
pub use parser::{
    BenchmarkCsvParser, CompanyCsvParser, ParsedSource, SourceParser, SourceType, detect_source,
};
pub use export::{export_all, write_integrated_csv, write_report_json};
pub use sample::SampleGenerator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
