use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use valuation_integration::{
    detect_source, export_all, logging, sample::DEFAULT_SEED, BenchmarkCsvParser,
    CompanyCsvParser, IndustryMatch, IntegrationPipeline, IssueCategory,
    PipelineConfig, SampleGenerator, SourceParser, SourceType,
};

#[derive(Parser)]
#[command(name = "valuation-integration")]
#[command(about = "Harmonize private-market transactions with industry benchmarks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate company and benchmark CSVs into one dataset + report
    Run {
        /// Private-market transactions CSV
        #[arg(long)]
        companies: PathBuf,
        /// Industry benchmark CSV
        #[arg(long)]
        benchmarks: PathBuf,
        /// TOML config (defaults to the built-in FX table)
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// Drop later rows sharing (company_name, fiscal_year)
        #[arg(long)]
        strict: bool,
        /// Match industries ignoring case and surrounding whitespace
        #[arg(long)]
        case_insensitive: bool,
    },
    /// Write seeded example input files
    Sample {
        #[arg(long, default_value = "input_data")]
        input_dir: PathBuf,
        #[arg(long, default_value_t = 10)]
        companies: usize,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            companies,
            benchmarks,
            config,
            output_dir,
            strict,
            case_insensitive,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::with_default_rates(),
            };
            if strict {
                config.strict_duplicates = true;
            }
            if case_insensitive {
                config.industry_match = IndustryMatch::CaseInsensitive;
            }
            run_integration(&companies, &benchmarks, config, &output_dir)
        }
        Commands::Sample {
            input_dir,
            companies,
            seed,
        } => write_samples(&input_dir, companies, seed),
    }
}

fn run_integration(
    companies_path: &Path,
    benchmarks_path: &Path,
    config: PipelineConfig,
    output_dir: &Path,
) -> Result<()> {
    println!("📊 Valuation Data Integration");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    expect_source(companies_path, SourceType::PrivateMarket)?;
    expect_source(benchmarks_path, SourceType::IndustryBenchmark)?;

    let pipeline = IntegrationPipeline::new(config)?;

    println!("\n📂 Loading sources...");
    let companies = CompanyCsvParser::new().parse(companies_path)?;
    let benchmarks = BenchmarkCsvParser::new().parse(benchmarks_path)?;
    println!("✓ {} private transactions", companies.total_rows());
    println!("✓ {} industry benchmarks", benchmarks.total_rows());
    let unreadable = companies.rejected.len() + benchmarks.rejected.len();
    if unreadable > 0 {
        println!("⚠ {} rows could not be read", unreadable);
    }

    println!("\n🔄 Integrating...");
    let output = pipeline.run_sources(&companies, &benchmarks);
    let report = &output.report;

    let (dataset_path, report_path) = export_all(output_dir, &output.records, report)?;
    info!(dataset = %dataset_path.display(), report = %report_path.display(), "Wrote outputs");

    println!("✓ {} integrated records", report.integrated_records);
    println!("✓ Data completeness: {:.2}%", report.completeness_score);
    if report.has_exclusions() {
        println!("⚠ {} rows excluded", report.excluded_records);
    }
    for category in IssueCategory::ALL {
        let count = report.count(category);
        if count > 0 {
            let marker = if category.excludes_row() { "✗" } else { "⚠" };
            println!("   {} {}: {}", marker, category.name(), count);
        }
    }

    println!("\n💾 Saved:");
    println!("   {}", dataset_path.display());
    println!("   {}", report_path.display());

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if report.needs_review() {
        println!("⚠️  Completed with findings - review {}", report_path.display());
    } else {
        println!("✅ Completed cleanly");
    }

    Ok(())
}

fn expect_source(path: &Path, expected: SourceType) -> Result<()> {
    let detected = detect_source(path)?;
    if detected != expected {
        bail!(
            "{} looks like {}, expected {}",
            path.display(),
            detected.name(),
            expected.name()
        );
    }
    Ok(())
}

fn write_samples(input_dir: &Path, count: usize, seed: u64) -> Result<()> {
    fs::create_dir_all(input_dir)
        .with_context(|| format!("Failed to create {}", input_dir.display()))?;

    let mut generator = SampleGenerator::new(seed);
    let companies = generator.companies(count);
    let benchmarks = generator.benchmarks();

    let companies_path = input_dir.join("private_market_data_example.csv");
    let mut wtr = csv::Writer::from_writer(File::create(&companies_path)?);
    for company in &companies {
        wtr.serialize(company)?;
    }
    wtr.flush()?;

    let benchmarks_path = input_dir.join("industry_benchmark_data_example.csv");
    let mut wtr = csv::Writer::from_writer(File::create(&benchmarks_path)?);
    for benchmark in &benchmarks {
        wtr.serialize(benchmark)?;
    }
    wtr.flush()?;

    println!("✓ {} companies → {}", companies.len(), companies_path.display());
    println!("✓ {} benchmarks → {}", benchmarks.len(), benchmarks_path.display());

    Ok(())
}
