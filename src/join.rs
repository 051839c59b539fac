// 🔗 Integration Joiner - company ↔ industry benchmark
// Exact hash join on industry. No fuzzy matching, no fallback.

use crate::error::IntegrationError;
use crate::records::{HarmonizedBenchmark, HarmonizedCompany, RowKey};
use crate::report::{Finding, IssueCategory, Rejection, Severity, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// MATCH MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryMatch {
    /// Byte-for-byte equal industry labels
    #[default]
    Exact,

    /// Trim + lower-case on both sides before comparing
    CaseInsensitive,
}

impl IndustryMatch {
    pub fn key(&self, industry: &str) -> String {
        match self {
            IndustryMatch::Exact => industry.to_string(),
            IndustryMatch::CaseInsensitive => industry.trim().to_lowercase(),
        }
    }
}

// ============================================================================
// JOIN OUTPUT
// ============================================================================

/// A company with the benchmark it matched, ready for metric calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPair<'a> {
    pub company: &'a HarmonizedCompany,
    pub benchmark: &'a HarmonizedBenchmark,
}

#[derive(Debug, Clone)]
pub struct JoinResult<'a> {
    /// Matched pairs, in company input order
    pub matched: Vec<JoinedPair<'a>>,
    pub unmatched: Vec<Rejection>,
    /// Extra benchmark rows that lost the first-encountered tie-break
    pub warnings: Vec<Finding>,
}

// ============================================================================
// INTEGRATION JOINER
// ============================================================================

pub struct IntegrationJoiner {
    pub industry_match: IndustryMatch,
}

impl IntegrationJoiner {
    pub fn new(industry_match: IndustryMatch) -> Self {
        IntegrationJoiner { industry_match }
    }

    pub fn join<'a>(
        &self,
        companies: &'a [HarmonizedCompany],
        benchmarks: &'a [HarmonizedBenchmark],
    ) -> JoinResult<'a> {
        let (index, warnings) = self.index_benchmarks(benchmarks);

        let mut matched = Vec::with_capacity(companies.len());
        let mut unmatched = Vec::new();

        for company in companies {
            match index.get(&self.industry_match.key(&company.industry)) {
                Some(&i) => matched.push(JoinedPair {
                    company,
                    benchmark: &benchmarks[i],
                }),
                None => unmatched.push(Rejection::new(
                    SourceKind::Company,
                    company.key(),
                    company.source_line,
                    IntegrationError::unmatched_industry(&company.industry),
                )),
            }
        }

        JoinResult {
            matched,
            unmatched,
            warnings,
        }
    }

    /// Industry key → position of the first benchmark row with that key.
    fn index_benchmarks(
        &self,
        benchmarks: &[HarmonizedBenchmark],
    ) -> (HashMap<String, usize>, Vec<Finding>) {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(benchmarks.len());
        let mut warnings = Vec::new();

        for (i, benchmark) in benchmarks.iter().enumerate() {
            let key = self.industry_match.key(&benchmark.industry);

            if let Some(&first) = index.get(&key) {
                warnings.push(Finding {
                    category: IssueCategory::DuplicateBenchmark,
                    severity: Severity::Warning,
                    row_key: RowKey::Benchmark {
                        industry: benchmark.industry.clone(),
                    },
                    rows: Vec::new(),
                    source_line: benchmark.source_line,
                    field: Some("industry".to_string()),
                    message: format!(
                        "Duplicate benchmark for '{}': using row {} and ignoring row {}",
                        benchmark.industry,
                        first + 1,
                        i + 1
                    ),
                });
                continue;
            }

            index.insert(key, i);
        }

        (index, warnings)
    }
}

impl Default for IntegrationJoiner {
    fn default() -> Self {
        Self::new(IndustryMatch::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
