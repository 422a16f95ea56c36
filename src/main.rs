//! CLI entry point for the urban heat-island pipeline.
//!
//! Provides subcommands for running the full batch pass over a reading table
//! and for inspecting the per-zone coverage of an input table.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use uhi_pipeline::analyzers::analyzer::run_pipeline;
use uhi_pipeline::analyzers::normalize::normalize;
use uhi_pipeline::config::PipelineConfig;
use uhi_pipeline::output::write_outputs;
use uhi_pipeline::source::{CsvFileSource, ReadingSource};
use uhi_pipeline::stats::coverage_report;

#[derive(Parser)]
#[command(name = "uhi_pipeline")]
#[command(about = "Clean, deseasonalize and rank per-zone hourly temperatures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the hourly, daily, hotspot and
    /// intervention-window datasets
    Run {
        /// CSV with timestamp, zone_id and temp_c columns
        #[arg(short, long, default_value = "data/raw/temperatures.csv")]
        input: PathBuf,

        /// Directory to write the datasets into
        #[arg(short, long, default_value = "reports")]
        output_dir: PathBuf,

        /// Maximum number of zones processed concurrently
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// Gzip compress the CSV datasets
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Robust z-score above which a reading is an outlier
        #[arg(long, default_value_t = 3.5)]
        z_threshold: f64,

        /// Per-zone quantile of the residual that marks a hotspot
        #[arg(long, default_value_t = 0.95)]
        hotspot_quantile: f64,
    },
    /// Report per-zone hourly coverage of an input table
    Inspect {
        /// CSV with timestamp, zone_id and temp_c columns
        #[arg(short, long, default_value = "data/raw/temperatures.csv")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/uhi_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("uhi_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            concurrency,
            gzip,
            z_threshold,
            hotspot_quantile,
        } => {
            let config = PipelineConfig::default()
                .with_z_threshold(z_threshold)
                .with_hotspot_quantile(hotspot_quantile);
            let source = CsvFileSource::new(&input);

            let (output, summary) = run_pipeline(&source, Arc::new(config), concurrency)
                .await
                .with_context(|| format!("pipeline failed for {}", input.display()))?;

            for failure in &output.failures {
                warn!(error = %failure, "Zone excluded from outputs");
            }

            let written = write_outputs(&output_dir, &output, &summary, gzip)?;
            for path in &written {
                info!(path = %path.display(), "Wrote");
            }
        }
        Commands::Inspect { input } => {
            inspect(&CsvFileSource::new(&input)).await?;
        }
    }

    Ok(())
}

/// Logs the hourly coverage of every zone in the input table.
#[tracing::instrument(skip_all, fields(source = %source.describe()))]
async fn inspect(source: &impl ReadingSource) -> Result<()> {
    let readings = source.load().await?;
    let input_rows = readings.len();
    let normalized = normalize(readings);
    let min_coverage = PipelineConfig::default().min_coverage;

    let report = coverage_report(&normalized);
    for zone in &report {
        let status = if zone.coverage() >= min_coverage {
            "ok"
        } else {
            "low"
        };
        info!(
            zone_id = %zone.zone_id,
            readings = zone.readings,
            missing_temps = zone.missing_temps,
            expected_hours = zone.expected_hours,
            coverage_pct = zone.coverage_pct(),
            first = ?zone.first,
            last = ?zone.last,
            status,
            "Zone coverage"
        );
    }

    let low = report.iter().filter(|z| z.coverage() < min_coverage).count();
    info!(
        input_rows,
        duplicates_dropped = input_rows - normalized.len(),
        zones = report.len(),
        low_coverage = low,
        "Coverage summary"
    );
    Ok(())
}
