//! CSV parser for the raw reading table.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::analyzers::types::Reading;
use crate::error::{PipelineError, Result};

/// Columns the input table must carry; any others are ignored.
pub const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "zone_id", "temp_c"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    zone_id: String,
    temp_c: Option<String>,
}

/// Decodes the input table from CSV bytes.
///
/// # Errors
///
/// Returns [`PipelineError::Schema`] if a required column is absent and
/// [`PipelineError::InvalidRecord`] for an unparseable timestamp or temperature.
pub fn parse_readings(bytes: &[u8]) -> Result<Vec<Reading>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    let mut readings = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());
        let record: RawRecord = row.deserialize(Some(&headers))?;

        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            PipelineError::InvalidRecord {
                line,
                reason: format!("unrecognized timestamp {:?}", record.timestamp),
            }
        })?;
        let temp_c = parse_temperature(record.temp_c.as_deref()).map_err(|reason| {
            PipelineError::InvalidRecord { line, reason }
        })?;

        readings.push(Reading {
            zone_id: record.zone_id,
            timestamp,
            temp_c,
        });
    }

    debug!(rows = readings.len(), "Input table parsed");
    Ok(readings)
}

/// Parses an RFC 3339 timestamp (any offset) or a naive timestamp taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|naive| naive.and_utc())
}

/// Blank cells are missing values; non-finite numbers are kept as missing too.
fn parse_temperature(cell: Option<&str>) -> std::result::Result<Option<f64>, String> {
    match cell {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(|t| t.is_finite().then_some(t))
            .map_err(|_| format!("unparseable temperature {s:?}")),
    }
}
