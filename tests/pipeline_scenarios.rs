// End-to-end integration scenarios through the public API

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::sync::Arc;
use valuation_integration::{
    export_all, BenchmarkCsvParser, BenchmarkRecord, CompanyCsvParser, CompanyRecord,
    CurrencyNormalizer, FxRateTable, IndustryMatch, IntegrationPipeline, IssueCategory,
    PipelineConfig, Severity, SourceParser,
};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn create_test_pipeline() -> IntegrationPipeline {
    IntegrationPipeline::new(PipelineConfig::with_default_rates()).unwrap()
}

fn tech_benchmark() -> BenchmarkRecord {
    BenchmarkRecord::new("Tech", 0.18, 0.12, 9.0, 50.0)
}

fn acme() -> CompanyRecord {
    CompanyRecord::new("Acme", "Tech", "Germany", "EUR", 100.0, 20.0, 8.5, 2024)
}

#[test]
fn test_eur_company_normalized_and_enriched() {
    let output = create_test_pipeline().run_at(&[acme()], &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    let row = output.records[0].to_row();

    assert_eq!(row.revenue, Some(107.0));
    assert_eq!(row.ebitda, Some(21.4));
    assert_eq!(row.ebitda_margin, Some(0.2));
    assert_eq!(row.valuation_multiple, 8.5);
    assert_eq!(row.valuation_vs_sector_avg, -0.5);
    assert_eq!(row.margin_vs_sector_avg, Some(0.02));
    assert_eq!(row.currency, "USD");
    assert_eq!(row.units, "millions");
    assert_eq!(row.data_source, "Integrated_Private_and_Benchmark");
    assert_eq!(row.last_updated, "2025-03-01 09:00:00");

    assert_eq!(output.report.completeness_score, 100.0);
    assert!(!output.report.needs_review());
    println!("✅ EUR company integrated: {:?}", row);
}

#[test]
fn test_unknown_currency_excluded() {
    let companies = vec![
        acme(),
        CompanyRecord::new("Mystery", "Tech", "Atlantis", "XYZ", 10.0, 2.0, 5.0, 2024),
    ];
    let output = create_test_pipeline().run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].company_name(), "Acme");
    assert_eq!(output.report.count(IssueCategory::UnknownCurrency), 1);
    assert_eq!(output.report.excluded_records, 1);

    let finding = output
        .report
        .findings_for(IssueCategory::UnknownCurrency)
        .next()
        .unwrap();
    assert_eq!(finding.severity, Severity::Critical);
    assert!(finding.message.contains("XYZ"));
}

#[test]
fn test_unmatched_industry_excluded() {
    let companies = vec![
        acme(),
        CompanyRecord::new("Qubit", "Quantum", "USA", "USD", 40.0, 4.0, 12.0, 2024),
    ];
    let output = create_test_pipeline().run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.report.count(IssueCategory::UnmatchedIndustry), 1);
    assert!(output.report.has_exclusions());
}

#[test]
fn test_duplicates_retained_and_flagged() {
    let companies = vec![acme(), acme()];
    let output = create_test_pipeline().run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 2);
    assert_eq!(output.report.count(IssueCategory::DuplicateKey), 1);

    let finding = output
        .report
        .findings_for(IssueCategory::DuplicateKey)
        .next()
        .unwrap();
    assert_eq!(finding.rows, vec![0, 1]);
}

#[test]
fn test_strict_mode_drops_later_duplicates() {
    let mut config = PipelineConfig::with_default_rates();
    config.strict_duplicates = true;
    let pipeline = IntegrationPipeline::new(config).unwrap();

    let output = pipeline.run_at(&[acme(), acme()], &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.report.dropped_duplicates, 1);
    assert_eq!(output.report.count(IssueCategory::DuplicateKey), 1);
}

#[test]
fn test_idempotent_runs() {
    let pipeline = create_test_pipeline();
    let companies = vec![
        acme(),
        usd_company("Volt", "Energy"),
        CompanyRecord::new("Mystery", "Tech", "Atlantis", "XYZ", 10.0, 2.0, 5.0, 2024),
    ];
    let benchmarks = vec![
        tech_benchmark(),
        BenchmarkRecord::new("Energy", 0.25, 0.04, 7.5, 300.0),
    ];

    let first = pipeline.run_at(&companies, &benchmarks, as_of());
    let second = pipeline.run_at(&companies, &benchmarks, as_of());

    assert_eq!(first.records, second.records);
    assert_eq!(first.report, second.report);
    assert_eq!(
        serde_json::to_string(&first.report).unwrap(),
        serde_json::to_string(&second.report).unwrap()
    );
    assert!(!first.report.dataset_fingerprint.is_empty());
}

fn usd_company(name: &str, industry: &str) -> CompanyRecord {
    CompanyRecord::new(name, industry, "USA", "USD", 80.0, 12.0, 7.0, 2024)
}

#[test]
fn test_currency_round_trip() {
    let rates = Arc::new(
        FxRateTable::new(vec![("EUR", 1.07), ("INR", 0.012), ("GBP", 1.21)]).unwrap(),
    );
    let normalizer = CurrencyNormalizer::new(rates.clone());

    for (currency, amount) in [("EUR", 123.456), ("INR", 98765.4321), ("GBP", 0.001)] {
        let usd = normalizer.to_usd_millions(amount, currency).unwrap();
        let back = usd / rates.rate(currency).unwrap();
        assert!((back - amount).abs() < 1e-9, "{} {} → {}", currency, amount, back);
    }
}

#[test]
fn test_every_output_row_has_benchmark_fields() {
    let companies = vec![acme(), usd_company("Volt", "Energy")];
    let benchmarks = vec![
        tech_benchmark(),
        BenchmarkRecord::new("Energy", 0.25, 0.04, 7.5, 300.0),
    ];
    let output = create_test_pipeline().run_at(&companies, &benchmarks, as_of());

    assert_eq!(output.records.len(), 2);
    for record in &output.records {
        let benchmark = benchmarks
            .iter()
            .find(|b| b.industry == record.industry())
            .unwrap();
        assert_eq!(record.average_margin(), benchmark.average_margin);
        assert_eq!(
            record.average_valuation_multiple(),
            benchmark.average_valuation_multiple
        );
        assert_eq!(record.market_size_billions(), benchmark.market_size_billions);
    }
}

#[test]
fn test_zero_revenue_gives_null_margin() {
    let companies = vec![CompanyRecord::new(
        "Seed", "Tech", "USA", "USD", 0.0, 0.0, 7.0, 2024,
    )];
    let output = create_test_pipeline().run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].ebitda_margin(), None);
    assert_eq!(output.records[0].margin_vs_sector_avg(), None);
    assert_eq!(output.records[0].revenue(), Some(0.0));
}

#[test]
fn test_validator_never_drops_in_default_mode() {
    let companies = vec![
        acme(),
        acme(),
        CompanyRecord::new("Loss", "Tech", "USA", "USD", 10.0, -80.0, -1.0, 2024),
    ];
    let output = create_test_pipeline().run_at(&companies, &[tech_benchmark()], as_of());

    // Duplicates and anomalies are reported, every joined row is kept
    assert_eq!(output.records.len(), 3);
    assert_eq!(output.report.excluded_records, 0);
    assert_eq!(output.report.dropped_duplicates, 0);
    assert!(output.report.count(IssueCategory::StatisticalAnomaly) >= 2);
    assert_eq!(output.report.negative_ebitda_rows, 1);
}

#[test]
fn test_case_insensitive_industry_match() {
    let mut config = PipelineConfig::with_default_rates();
    config.industry_match = IndustryMatch::CaseInsensitive;
    let pipeline = IntegrationPipeline::new(config).unwrap();

    let companies = vec![CompanyRecord::new(
        "Acme", " tech ", "Germany", "EUR", 100.0, 20.0, 8.5, 2024,
    )];
    let output = pipeline.run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.report.count(IssueCategory::UnmatchedIndustry), 0);
}

#[test]
fn test_csv_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let companies_path = dir.path().join("private_market_data_example.csv");
    let benchmarks_path = dir.path().join("industry_benchmark_data_example.csv");

    fs::write(
        &companies_path,
        "company_name,industry,country,currency,revenue_local,ebitda_local,valuation_multiple,fiscal_year\n\
         Acme,Tech,Germany,EUR,100,20,8.5,2024\n\
         Broken,Tech,USA,USD,abc,1,5,2024\n\
         Blank,Tech,USA,USD,10,2,,2024\n\
         Volt,Energy,USA,USD,,15,6.0,2024\n",
    )
    .unwrap();
    fs::write(
        &benchmarks_path,
        "industry,average_margin,sector_growth_rate,average_valuation_multiple,market_size_billions\n\
         Tech,0.18,0.12,9.0,50\n\
         Energy,0.25,0.04,7.5,300\n",
    )
    .unwrap();

    let companies = CompanyCsvParser::new().parse(&companies_path).unwrap();
    let benchmarks = BenchmarkCsvParser::new().parse(&benchmarks_path).unwrap();
    assert_eq!(companies.rejected.len(), 1);
    let output = create_test_pipeline().run_sources_at(&companies, &benchmarks, as_of());

    // One unreadable row and one empty multiple are excluded, the run completes
    assert_eq!(output.report.total_companies, 4);
    assert_eq!(output.report.excluded_records, 2);
    assert_eq!(output.report.count(IssueCategory::MalformedRow), 1);
    assert_eq!(output.report.count(IssueCategory::InvalidAmount), 1);

    // Empty revenue is missing, not zero
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[1].company_name(), "Volt");
    assert_eq!(output.records[1].revenue(), None);
    assert!(output.report.count(IssueCategory::MissingField) >= 1);
    assert!(output.report.completeness_score < 100.0);

    let out_dir = dir.path().join("output");
    let (dataset, report) = export_all(&out_dir, &output.records, &output.report).unwrap();

    let csv_text = fs::read_to_string(dataset).unwrap();
    assert_eq!(csv_text.lines().count(), 3);
    assert!(csv_text.contains("Acme,Tech,Germany,2024,107.0,21.4"));

    let json_text = fs::read_to_string(report).unwrap();
    assert!(json_text.contains("\"MissingField\""));
    assert!(json_text.contains("\"MalformedRow\""));
    println!("✅ CSV end to end: {} rows", output.records.len());
}

#[test]
fn test_duplicate_benchmark_first_row_wins() {
    let benchmarks = vec![
        tech_benchmark(),
        BenchmarkRecord::new("Tech", 0.30, 0.02, 12.0, 75.0),
    ];
    let output = create_test_pipeline().run_at(&[acme()], &benchmarks, as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.report.count(IssueCategory::DuplicateBenchmark), 1);
    assert_eq!(output.report.excluded_records, 0);

    let record = &output.records[0];
    assert_eq!(record.average_margin(), 0.18);
    assert_eq!(record.sector_growth_rate(), 0.12);
    assert_eq!(record.average_valuation_multiple(), 9.0);
    assert_eq!(record.market_size_billions(), 50.0);

    let finding = output
        .report
        .findings_for(IssueCategory::DuplicateBenchmark)
        .next()
        .unwrap();
    assert_eq!(finding.severity, Severity::Warning);
    println!("✅ Duplicate benchmark: {}", finding.message);
}

#[test]
fn test_overflowing_amount_excluded_not_zero_margin() {
    let companies = vec![
        acme(),
        CompanyRecord::new("Big", "Tech", "UK", "GBP", 1.7e308, 1.0, 8.0, 2024),
    ];
    let output = create_test_pipeline().run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].company_name(), "Acme");
    assert_eq!(output.report.count(IssueCategory::InvalidAmount), 1);
    assert!(output.records.iter().all(|r| r.revenue().map_or(true, f64::is_finite)));
}

#[test]
fn test_strict_report_rows_point_into_output() {
    let mut config = PipelineConfig::with_default_rates();
    config.strict_duplicates = true;
    let pipeline = IntegrationPipeline::new(config).unwrap();

    let companies = vec![
        acme(),
        acme(),
        CompanyRecord::new("Loss", "Tech", "USA", "USD", 10.0, 1.0, -1.0, 2024),
    ];
    let output = pipeline.run_at(&companies, &[tech_benchmark()], as_of());

    assert_eq!(output.records.len(), 2);
    assert_eq!(output.report.count(IssueCategory::DuplicateKey), 1);
    assert_eq!(output.report.count(IssueCategory::StatisticalAnomaly), 1);
    for finding in &output.report.findings {
        for &row in &finding.rows {
            assert_eq!(output.records[row].key(), finding.row_key);
        }
    }
}
