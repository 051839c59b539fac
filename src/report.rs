// 📋 Integration Report
// Everything the run found, kept apart from the dataset itself.

use crate::error::IntegrationError;
use crate::records::RowKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CATEGORIES & SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    /// Row excluded: currency not in the FX table
    UnknownCurrency,
    /// Row excluded: non-finite amount or multiple
    InvalidAmount,
    /// Row excluded: no benchmark for the industry
    UnmatchedIndustry,
    /// Advisory: required output field is absent
    MissingField,
    /// Advisory: (company_name, fiscal_year) seen more than once
    DuplicateKey,
    /// Advisory: implausible value, needs human review
    StatisticalAnomaly,
    /// Advisory: two benchmark rows for one industry, first one used
    DuplicateBenchmark,
    /// Row excluded: the source line could not be read as a record
    MalformedRow,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 8] = [
        IssueCategory::UnknownCurrency,
        IssueCategory::InvalidAmount,
        IssueCategory::UnmatchedIndustry,
        IssueCategory::MissingField,
        IssueCategory::DuplicateKey,
        IssueCategory::StatisticalAnomaly,
        IssueCategory::DuplicateBenchmark,
        IssueCategory::MalformedRow,
    ];

    pub fn name(&self) -> &str {
        match self {
            IssueCategory::UnknownCurrency => "UnknownCurrency",
            IssueCategory::InvalidAmount => "InvalidAmount",
            IssueCategory::UnmatchedIndustry => "UnmatchedIndustry",
            IssueCategory::MissingField => "MissingField",
            IssueCategory::DuplicateKey => "DuplicateKey",
            IssueCategory::StatisticalAnomaly => "StatisticalAnomaly",
            IssueCategory::DuplicateBenchmark => "DuplicateBenchmark",
            IssueCategory::MalformedRow => "MalformedRow",
        }
    }

    /// Whether findings of this category mean the row left the dataset
    pub fn excludes_row(&self) -> bool {
        matches!(
            self,
            IssueCategory::UnknownCurrency
                | IssueCategory::InvalidAmount
                | IssueCategory::UnmatchedIndustry
                | IssueCategory::MalformedRow
        )
    }
}

impl From<&IntegrationError> for IssueCategory {
    fn from(err: &IntegrationError) -> Self {
        match err {
            IntegrationError::UnknownCurrency { .. } => IssueCategory::UnknownCurrency,
            IntegrationError::InvalidAmount { .. } | IntegrationError::MissingValue { .. } => {
                IssueCategory::InvalidAmount
            }
            IntegrationError::UnmatchedIndustry { .. } => IssueCategory::UnmatchedIndustry,
            IntegrationError::MalformedRow { .. } => IssueCategory::MalformedRow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Row was excluded from the dataset
    Warning,  // Row kept, needs review
}

// ============================================================================
// FINDINGS & REJECTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Company,
    Benchmark,
}

/// A raw row the harmonizer or joiner refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub source: SourceKind,
    pub row_key: RowKey,
    pub source_line: Option<usize>,
    pub error: IntegrationError,
}

impl Rejection {
    pub fn new(
        source: SourceKind,
        row_key: RowKey,
        source_line: Option<usize>,
        error: IntegrationError,
    ) -> Self {
        Rejection {
            source,
            row_key,
            source_line,
            error,
        }
    }

    pub fn category(&self) -> IssueCategory {
        IssueCategory::from(&self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: IssueCategory,
    pub severity: Severity,
    pub row_key: RowKey,

    /// Output row indices involved (empty for excluded rows)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub message: String,
}

impl From<&Rejection> for Finding {
    fn from(rejection: &Rejection) -> Self {
        let field = match &rejection.error {
            IntegrationError::UnknownCurrency { .. } => Some("currency".to_string()),
            IntegrationError::InvalidAmount { field, .. }
            | IntegrationError::MissingValue { field } => Some(field.clone()),
            IntegrationError::UnmatchedIndustry { .. } => Some("industry".to_string()),
            IntegrationError::MalformedRow { .. } => None,
        };

        Finding {
            category: rejection.category(),
            severity: Severity::Critical,
            row_key: rejection.row_key.clone(),
            rows: Vec::new(),
            source_line: rejection.source_line,
            field,
            message: rejection.error.to_string(),
        }
    }
}

// ============================================================================
// INTEGRATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationReport {
    pub total_companies: usize,
    pub total_benchmarks: usize,
    pub integrated_records: usize,
    pub excluded_records: usize,
    pub counts: BTreeMap<IssueCategory, usize>,
    pub findings: Vec<Finding>,

    /// Share of required output cells present, in percent
    pub completeness_score: f64,
    pub negative_ebitda_rows: usize,

    /// SHA-256 over the serialized integrated dataset
    pub dataset_fingerprint: String,
    pub strict_duplicates: bool,
    pub dropped_duplicates: usize,
}

impl IntegrationReport {
    pub fn new(total_companies: usize, total_benchmarks: usize) -> Self {
        IntegrationReport {
            total_companies,
            total_benchmarks,
            integrated_records: 0,
            excluded_records: 0,
            counts: IssueCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            findings: Vec::new(),
            completeness_score: 100.0,
            negative_ebitda_rows: 0,
            dataset_fingerprint: String::new(),
            strict_duplicates: false,
            dropped_duplicates: 0,
        }
    }

    pub fn record(&mut self, finding: Finding) {
        *self.counts.entry(finding.category).or_insert(0) += 1;
        self.findings.push(finding);
    }

    pub fn record_rejection(&mut self, rejection: &Rejection) {
        if rejection.source == SourceKind::Company {
            self.excluded_records += 1;
        }
        self.record(Finding::from(rejection));
    }

    pub fn count(&self, category: IssueCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn findings_for(&self, category: IssueCategory) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    pub fn has_exclusions(&self) -> bool {
        self.excluded_records > 0
    }

    /// Anything a human should look at before trusting the dataset
    pub fn needs_review(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} companies, {} benchmarks → {} integrated, {} excluded | completeness {:.2}% | {} findings ({} unknown currency, {} invalid amount, {} unmatched industry, {} missing field, {} duplicate key, {} anomaly, {} malformed)",
            self.total_companies,
            self.total_benchmarks,
            self.integrated_records,
            self.excluded_records,
            self.completeness_score,
            self.findings.len(),
            self.count(IssueCategory::UnknownCurrency),
            self.count(IssueCategory::InvalidAmount),
            self.count(IssueCategory::UnmatchedIndustry),
            self.count(IssueCategory::MissingField),
            self.count(IssueCategory::DuplicateKey),
            self.count(IssueCategory::StatisticalAnomaly),
            self.count(IssueCategory::MalformedRow),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
