// 🏗️ Source Parsers
// CSV → raw records, one parser per source, with line provenance

use crate::error::IntegrationError;
use crate::records::{BenchmarkRecord, CompanyRecord, RowKey};
use crate::report::{Rejection, SourceKind};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which collector a file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    PrivateMarket,
    IndustryBenchmark,
}

impl SourceType {
    pub fn name(&self) -> &str {
        match self {
            SourceType::PrivateMarket => "Private market transactions",
            SourceType::IndustryBenchmark => "Industry benchmarks",
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceType::PrivateMarket => SourceKind::Company,
            SourceType::IndustryBenchmark => SourceKind::Benchmark,
        }
    }

    /// Best-effort key for a row that did not deserialize
    fn row_key(&self, headers: &StringRecord, row: &StringRecord, line: usize) -> RowKey {
        let cell = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .and_then(|i| row.get(i))
                .filter(|value| !value.is_empty())
        };

        match self {
            SourceType::PrivateMarket => match cell("company_name") {
                Some(name) => RowKey::Company {
                    company_name: name.to_string(),
                    fiscal_year: cell("fiscal_year").and_then(|y| y.parse().ok()),
                },
                None => RowKey::SourceLine { line },
            },
            SourceType::IndustryBenchmark => match cell("industry") {
                Some(industry) => RowKey::Benchmark {
                    industry: industry.to_string(),
                },
                None => RowKey::SourceLine { line },
            },
        }
    }

    /// Header that only this source has
    fn marker_column(&self) -> &str {
        match self {
            SourceType::PrivateMarket => "currency",
            SourceType::IndustryBenchmark => "average_margin",
        }
    }
}

/// Rows read from one file. Rows that could not be read as records are kept
/// as rejections so the run can report them instead of stopping.
#[derive(Debug, Clone)]
pub struct ParsedSource<T> {
    pub records: Vec<T>,
    pub rejected: Vec<Rejection>,
}

impl<T> ParsedSource<T> {
    /// Data rows seen in the file, readable or not
    pub fn total_rows(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// SourceParser - one implementation per input source
pub trait SourceParser: Send + Sync {
    type Record: DeserializeOwned;

    fn source_type(&self) -> SourceType;

    /// Attach the source line to a row that deserialized
    fn with_line(&self, record: Self::Record, line: usize) -> Self::Record;

    /// Parse rows from any reader. `source_name` is used in messages.
    ///
    /// Only an unreadable stream or header row is an error; a bad data row
    /// becomes a `MalformedRow` rejection.
    fn parse_reader<R: Read>(&self, reader: R, source_name: &str) -> Result<ParsedSource<Self::Record>> {
        read_rows(self, reader, source_name)
    }

    fn parse(&self, file_path: &Path) -> Result<ParsedSource<Self::Record>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;
        self.parse_reader(file, &file_path.display().to_string())
    }
}

// ============================================================================
// PARSERS
// ============================================================================

pub struct CompanyCsvParser;

impl CompanyCsvParser {
    pub fn new() -> Self {
        CompanyCsvParser
    }
}

impl Default for CompanyCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for CompanyCsvParser {
    type Record = CompanyRecord;

    fn source_type(&self) -> SourceType {
        SourceType::PrivateMarket
    }

    fn with_line(&self, record: CompanyRecord, line: usize) -> CompanyRecord {
        record.with_source_line(line)
    }
}

pub struct BenchmarkCsvParser;

impl BenchmarkCsvParser {
    pub fn new() -> Self {
        BenchmarkCsvParser
    }
}

impl Default for BenchmarkCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for BenchmarkCsvParser {
    type Record = BenchmarkRecord;

    fn source_type(&self) -> SourceType {
        SourceType::IndustryBenchmark
    }

    fn with_line(&self, record: BenchmarkRecord, line: usize) -> BenchmarkRecord {
        record.with_source_line(line)
    }
}

/// Deserialize every row, pairing it with its line number (header = line 1).
fn read_rows<P, R>(parser: &P, reader: R, source_name: &str) -> Result<ParsedSource<P::Record>>
where
    P: SourceParser + ?Sized,
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers of {}", source_name))?
        .clone();
    let source = parser.source_type();

    let mut parsed = ParsedSource {
        records: Vec::new(),
        rejected: Vec::new(),
    };

    for (index, result) in reader.records().enumerate() {
        let fallback_line = index + 2; // 1-indexed + header row

        let outcome = match result {
            Ok(row) => {
                let line = row
                    .position()
                    .map_or(fallback_line, |pos| pos.line() as usize);
                match row.deserialize::<P::Record>(Some(&headers)) {
                    Ok(record) => Ok(parser.with_line(record, line)),
                    Err(err) => Err((line, source.row_key(&headers, &row, line), err)),
                }
            }
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                return Err(err).with_context(|| format!("Failed to read {}", source_name));
            }
            Err(err) => {
                let line = err
                    .position()
                    .map_or(fallback_line, |pos| pos.line() as usize);
                Err((line, RowKey::SourceLine { line }, err))
            }
        };

        match outcome {
            Ok(record) => parsed.records.push(record),
            Err((line, row_key, err)) => {
                warn!(source = source_name, line, error = %err, "Skipping malformed CSV row");
                parsed.rejected.push(Rejection::new(
                    source.kind(),
                    row_key,
                    Some(line),
                    IntegrationError::malformed_row(&err.to_string()),
                ));
            }
        }
    }

    Ok(parsed)
}

// ============================================================================
// SOURCE DETECTION
// ============================================================================

/// Identify a file's source from its header row.
pub fn detect_source(file_path: &Path) -> Result<SourceType> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers of {}", file_path.display()))?;

    [SourceType::PrivateMarket, SourceType::IndustryBenchmark]
        .into_iter()
        .find(|source| headers.iter().any(|h| h == source.marker_column()))
        .ok_or_else(|| anyhow!("Unknown source format: {}", file_path.display()))
}

// ============================================================================
// TESTS
// ============================================================================
