// ✅ Data Quality Validator
// Audits the final integrated set as a whole. Advisory only: it reports,
// it never edits or removes rows (strict duplicate dropping is a separate,
// explicit step).
//
// Checks:
//   1. Missing required field  (company_name, industry, country, fiscal_year, revenue, ebitda)
//   2. Duplicate key           (company_name, fiscal_year)
//   3. Statistical anomaly     (revenue < 0, margin out of bounds, multiple <= 0)

use crate::fx::round2;
use crate::records::{IntegratedRecord, RowKey};
use crate::report::{Finding, IssueCategory, Severity};
use std::collections::HashMap;

pub const DEFAULT_MARGIN_BOUNDS: (f64, f64) = (-5.0, 5.0);

const REQUIRED_FIELDS: usize = 6;

// ============================================================================
// AUDIT RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QualityAudit {
    pub findings: Vec<Finding>,
    pub completeness_score: f64,
    pub negative_ebitda_rows: usize,
}

impl QualityAudit {
    pub fn count(&self, category: IssueCategory) -> usize {
        self.findings.iter().filter(|f| f.category == category).count()
    }
}

// ============================================================================
// DATA QUALITY VALIDATOR
// ============================================================================

pub struct DataQualityValidator {
    /// Drop later duplicates (keep first) when applying strict mode
    pub strict_duplicates: bool,

    /// Inclusive range for a plausible ebitda_margin (default ±500%)
    pub margin_bounds: (f64, f64),
}

impl DataQualityValidator {
    pub fn new() -> Self {
        DataQualityValidator {
            strict_duplicates: false,
            margin_bounds: DEFAULT_MARGIN_BOUNDS,
        }
    }

    pub fn with_settings(strict_duplicates: bool, margin_bounds: (f64, f64)) -> Self {
        DataQualityValidator {
            strict_duplicates,
            margin_bounds,
        }
    }

    /// Scan the integrated set. Findings come grouped by check (missing
    /// fields, duplicates, anomalies), row order within each group.
    pub fn audit(&self, records: &[IntegratedRecord]) -> QualityAudit {
        let mut findings = Vec::new();
        let mut present_cells = 0usize;

        for (i, record) in records.iter().enumerate() {
            let missing = missing_fields(record);
            present_cells += REQUIRED_FIELDS - missing.len();

            for field in missing {
                findings.push(Finding {
                    category: IssueCategory::MissingField,
                    severity: Severity::Warning,
                    row_key: record.key(),
                    rows: vec![i],
                    source_line: None,
                    field: Some(field.to_string()),
                    message: format!("Required field '{}' is missing", field),
                });
            }
        }

        findings.extend(self.check_duplicates(records));

        for (i, record) in records.iter().enumerate() {
            findings.extend(self.check_anomalies(i, record));
        }

        let completeness_score = if records.is_empty() {
            100.0
        } else {
            let total_cells = records.len() * REQUIRED_FIELDS;
            round2(present_cells as f64 / total_cells as f64 * 100.0)
        };

        let negative_ebitda_rows = records
            .iter()
            .filter(|r| r.ebitda().map_or(false, |e| e < 0.0))
            .count();

        QualityAudit {
            findings,
            completeness_score,
            negative_ebitda_rows,
        }
    }

    /// Strict mode: keep the first row per (company_name, fiscal_year).
    ///
    /// Returns the kept rows (order preserved) and one `DuplicateKey` finding
    /// per collapsed group, pointing at the surviving row's index in the kept
    /// set. Audit the kept rows afterwards so every index stays valid.
    /// Does nothing unless `strict_duplicates` is set.
    pub fn apply_strict(
        &self,
        records: Vec<IntegratedRecord>,
    ) -> (Vec<IntegratedRecord>, Vec<Finding>) {
        if !self.strict_duplicates {
            return (records, Vec::new());
        }

        // key -> (index in kept, rows seen)
        let mut groups: HashMap<RowKey, (usize, usize)> = HashMap::with_capacity(records.len());
        let mut order: Vec<RowKey> = Vec::new();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            let key = record.key();
            match groups.get_mut(&key) {
                Some((_, seen)) => *seen += 1,
                None => {
                    groups.insert(key.clone(), (kept.len(), 1));
                    order.push(key);
                    kept.push(record);
                }
            }
        }

        let findings = order
            .into_iter()
            .filter_map(|key| {
                let (index, seen) = groups.remove(&key)?;
                if seen < 2 {
                    return None;
                }
                Some(Finding {
                    category: IssueCategory::DuplicateKey,
                    severity: Severity::Warning,
                    message: format!(
                        "{} rows share key {}, kept the first and dropped {}",
                        seen,
                        key,
                        seen - 1
                    ),
                    row_key: key,
                    rows: vec![index],
                    source_line: None,
                    field: None,
                })
            })
            .collect();

        (kept, findings)
    }

    // ========================================================================
    // CHECKS
    // ========================================================================

    /// One finding per duplicated key, listing every row in the group.
    fn check_duplicates(&self, records: &[IntegratedRecord]) -> Vec<Finding> {
        let mut groups: HashMap<RowKey, Vec<usize>> = HashMap::new();
        let mut order: Vec<RowKey> = Vec::new();

        for (i, record) in records.iter().enumerate() {
            let key = record.key();
            let rows = groups.entry(key.clone()).or_default();
            if rows.is_empty() {
                order.push(key);
            }
            rows.push(i);
        }

        order
            .into_iter()
            .filter_map(|key| {
                let rows = groups.remove(&key)?;
                if rows.len() < 2 {
                    return None;
                }
                Some(Finding {
                    category: IssueCategory::DuplicateKey,
                    severity: Severity::Warning,
                    message: format!("{} rows share key {}", rows.len(), key),
                    row_key: key,
                    rows,
                    source_line: None,
                    field: None,
                })
            })
            .collect()
    }

    fn check_anomalies(&self, i: usize, record: &IntegratedRecord) -> Vec<Finding> {
        let mut findings = Vec::new();
        let (min, max) = self.margin_bounds;

        let mut flag = |field: &str, message: String| {
            findings.push(Finding {
                category: IssueCategory::StatisticalAnomaly,
                severity: Severity::Warning,
                row_key: record.key(),
                rows: vec![i],
                source_line: None,
                field: Some(field.to_string()),
                message,
            });
        };

        if let Some(revenue) = record.revenue() {
            if revenue < 0.0 {
                flag("revenue", format!("Negative revenue: {:.2}", revenue));
            }
        }

        if let Some(margin) = record.ebitda_margin() {
            if margin < min || margin > max {
                flag(
                    "ebitda_margin",
                    format!(
                        "EBITDA margin {:.2} outside [{:.2}, {:.2}]",
                        margin, min, max
                    ),
                );
            }
        }

        if record.valuation_multiple() <= 0.0 {
            flag(
                "valuation_multiple",
                format!(
                    "Non-positive valuation multiple: {:.2}",
                    record.valuation_multiple()
                ),
            );
        }

        findings
    }
}

impl Default for DataQualityValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_fields(record: &IntegratedRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();

    if record.company_name().trim().is_empty() {
        missing.push("company_name");
    }
    if record.industry().trim().is_empty() {
        missing.push("industry");
    }
    if record.country().trim().is_empty() {
        missing.push("country");
    }
    if record.fiscal_year().is_none() {
        missing.push("fiscal_year");
    }
    if record.revenue().is_none() {
        missing.push("revenue");
    }
    if record.ebitda().is_none() {
        missing.push("ebitda");
    }

    missing
}

// ============================================================================
// TESTS
// ============================================================================
