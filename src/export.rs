// 💾 Exporters
// Integrated dataset → CSV (values rounded here, nowhere earlier)
// Report → pretty JSON

use crate::records::IntegratedRecord;
use crate::report::IntegrationReport;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DATASET_FILE: &str = "final_integrated_valuation_data.csv";
pub const REPORT_FILE: &str = "validation_report.json";

pub fn write_integrated_csv<W: Write>(writer: W, records: &[IntegratedRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for record in records {
        wtr.serialize(record.to_row())
            .with_context(|| format!("Failed to write row for {}", record.key()))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

pub fn write_report_json<W: Write>(mut writer: W, report: &IntegrationReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write both artifacts into `output_dir`, creating it if needed.
/// Returns (dataset path, report path).
pub fn export_all(
    output_dir: &Path,
    records: &[IntegratedRecord],
    report: &IntegrationReport,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let dataset_path = output_dir.join(DATASET_FILE);
    let file = File::create(&dataset_path)
        .with_context(|| format!("Failed to create {}", dataset_path.display()))?;
    write_integrated_csv(file, records)?;

    let report_path = output_dir.join(REPORT_FILE);
    let file = File::create(&report_path)
        .with_context(|| format!("Failed to create {}", report_path.display()))?;
    write_report_json(file, report)?;

    Ok((dataset_path, report_path))
}

// ============================================================================
// TESTS
// ============================================================================
