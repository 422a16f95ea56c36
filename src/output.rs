//! Persistence for the pipeline's datasets.
//!
//! Each dataset is written as CSV (optionally gzip-compressed) with a fixed
//! column order; the run summary is written as pretty-printed JSON.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::analyzers::types::{Dataset, PipelineOutput, RunSummary};

pub const HOURLY_FILE: &str = "zone_hourly";
pub const DAILY_FILE: &str = "zone_daily";
pub const HOTSPOTS_FILE: &str = "hotspots";
pub const WINDOWS_FILE: &str = "intervention_windows";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Serializes `rows` as CSV into any writer, headers first. An empty table
/// is written as its header line alone.
pub fn write_rows<W: Write, T: Dataset>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    if rows.is_empty() {
        writer.write_record(T::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `rows` to `<dir>/<name>.csv`, or `<dir>/<name>.csv.gz` when `gzip`
/// is set, and returns the path written.
pub fn write_dataset<T: Dataset>(dir: &Path, name: &str, rows: &[T], gzip: bool) -> Result<PathBuf> {
    let path = if gzip {
        dir.join(format!("{name}.csv.gz"))
    } else {
        dir.join(format!("{name}.csv"))
    };
    debug!(path = %path.display(), rows = rows.len(), gzip, "Writing dataset");

    let file = File::create(&path)?;
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_rows(&mut encoder, rows)?;
        encoder.finish()?;
    } else {
        write_rows(file, rows)?;
    }

    Ok(path)
}

/// Writes the four datasets and the run summary into `dir`, creating it if needed.
pub fn write_outputs(
    dir: &Path,
    output: &PipelineOutput,
    summary: &RunSummary,
    gzip: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = vec![
        write_dataset(dir, HOURLY_FILE, &output.hourly, gzip)?,
        write_dataset(dir, DAILY_FILE, &output.daily, gzip)?,
        write_dataset(dir, HOTSPOTS_FILE, &output.hotspots, gzip)?,
        write_dataset(dir, WINDOWS_FILE, &output.windows, gzip)?,
    ];

    let summary_path = dir.join(SUMMARY_FILE);
    std::fs::write(&summary_path, serde_json::to_string_pretty(summary)?)?;
    written.push(summary_path);

    info!(dir = %dir.display(), files = written.len(), "Outputs written");
    Ok(written)
}
