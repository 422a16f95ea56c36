//! Data types used by the heat-island pipeline.
//!
//! Each stage owns its output type: [`NormalizedReading`] → [`CleanedReading`]
//! → [`FeaturedReading`] → [`HourlyRecord`], with [`DailyAggregate`],
//! [`Hotspot`] and [`InterventionWindow`] derived from the hourly table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};

use crate::error::ZoneError;

/// Format used for every persisted timestamp (naive UTC, no offset marker).
pub const NAIVE_UTC_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn naive_utc<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(NAIVE_UTC_FORMAT))
}

/// A persisted row type. `COLUMNS` lists its CSV header in serialization
/// order, so an empty table still gets a header.
pub trait Dataset: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl Dataset for HourlyRecord {
    const COLUMNS: &'static [&'static str] = &[
        "zone_id",
        "timestamp",
        "temp_c",
        "temp_c_clean",
        "is_outlier",
        "roll24_mean",
        "roll168_mean",
        "roll24_median",
        "seasonal_mean",
        "deseasonalized",
        "is_night",
        "date",
        "hour",
        "weekday",
        "month",
    ];
}

impl Dataset for DailyAggregate {
    const COLUMNS: &'static [&'static str] = &[
        "zone_id",
        "date",
        "mean_temp_c",
        "max_temp_c",
        "min_temp_c",
        "mean_deseasonalized",
        "prop_outliers",
        "night_retention",
    ];
}

impl Dataset for Hotspot {
    const COLUMNS: &'static [&'static str] =
        &["timestamp", "zone_id", "temp_c", "deseasonalized", "hour", "weekday"];
}

impl Dataset for InterventionWindow {
    const COLUMNS: &'static [&'static str] = &[
        "zone_id",
        "hour",
        "avg_temp",
        "avg_deseasonalized",
        "night_retention",
        "rank_coolest",
        "rank_low_deseason",
        "suggested_window_score",
    ];
}

/// One raw temperature reading as produced by the acquisition collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub zone_id: String,
    pub timestamp: DateTime<Utc>,
    /// `None` when the source had no usable value for this hour.
    pub temp_c: Option<f64>,
}

/// A deduplicated reading with calendar fields derived from its UTC timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReading {
    pub zone_id: String,
    pub timestamp: DateTime<Utc>,
    pub temp_c: Option<f64>,
    pub date: NaiveDate,
    pub hour: u32,
    /// Monday = 0 .. Sunday = 6.
    pub weekday: u32,
    pub month: u32,
}

impl From<NormalizedReading> for Reading {
    fn from(r: NormalizedReading) -> Self {
        Reading {
            zone_id: r.zone_id,
            timestamp: r.timestamp,
            temp_c: r.temp_c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedReading {
    pub reading: NormalizedReading,
    pub is_outlier: bool,
    /// Gap-free after the fill step.
    pub temp_c_clean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedReading {
    pub cleaned: CleanedReading,
    pub roll24_mean: Option<f64>,
    pub roll168_mean: Option<f64>,
    pub roll24_median: Option<f64>,
}

/// A fully derived hourly row; field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub zone_id: String,
    #[serde(serialize_with = "naive_utc")]
    pub timestamp: DateTime<Utc>,
    pub temp_c: Option<f64>,
    pub temp_c_clean: f64,
    pub is_outlier: bool,
    pub roll24_mean: Option<f64>,
    pub roll168_mean: Option<f64>,
    pub roll24_median: Option<f64>,
    pub seasonal_mean: f64,
    pub deseasonalized: f64,
    pub is_night: bool,
    pub date: NaiveDate,
    pub hour: u32,
    pub weekday: u32,
    pub month: u32,
}

/// Daily summary for one (zone, date).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub zone_id: String,
    pub date: NaiveDate,
    pub mean_temp_c: f64,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub mean_deseasonalized: f64,
    pub prop_outliers: f64,
    /// Night average minus the prior day's afternoon average.
    pub night_retention: Option<f64>,
}

/// An hourly row whose residual reached the zone's upper percentile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    #[serde(serialize_with = "naive_utc")]
    pub timestamp: DateTime<Utc>,
    pub zone_id: String,
    /// Cleaned temperature of the hour.
    pub temp_c: f64,
    pub deseasonalized: f64,
    pub hour: u32,
    pub weekday: u32,
}

/// Hour-of-day ranking row for one zone; lower score is a better window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionWindow {
    pub zone_id: String,
    pub hour: u32,
    pub avg_temp: f64,
    pub avg_deseasonalized: f64,
    pub night_retention: Option<f64>,
    pub rank_coolest: u32,
    pub rank_low_deseason: u32,
    pub suggested_window_score: f64,
}

/// Every table produced for a single zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneOutput {
    pub zone_id: String,
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailyAggregate>,
    pub hotspots: Vec<Hotspot>,
    pub windows: Vec<InterventionWindow>,
}

/// Concatenated per-zone tables plus the zones that were skipped.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub hourly: Vec<HourlyRecord>,
    pub daily: Vec<DailyAggregate>,
    pub hotspots: Vec<Hotspot>,
    pub windows: Vec<InterventionWindow>,
    pub zones_processed: Vec<String>,
    pub failures: Vec<ZoneError>,
}

impl PipelineOutput {
    /// Appends one zone's tables, keeping the zone's rows contiguous.
    pub fn push_zone(&mut self, zone: ZoneOutput) {
        self.zones_processed.push(zone.zone_id);
        self.hourly.extend(zone.hourly);
        self.daily.extend(zone.daily);
        self.hotspots.extend(zone.hotspots);
        self.windows.extend(zone.windows);
    }
}

#[derive(Debug, Serialize)]
pub struct SkippedZone {
    pub(crate) zone_id: String,
    pub(crate) reason: String,
}

/// Written next to the datasets as `run_summary.json`.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) input_rows: usize,
    pub(crate) duplicates_dropped: usize,
    pub(crate) zones_processed: usize,
    pub(crate) zones_skipped: Vec<SkippedZone>,
    pub(crate) hourly_rows: usize,
    pub(crate) daily_rows: usize,
    pub(crate) hotspot_rows: usize,
    pub(crate) window_rows: usize,
}

impl RunSummary {
    pub fn new(output: &PipelineOutput, input_rows: usize, duplicates_dropped: usize) -> Self {
        let zones_skipped = output
            .failures
            .iter()
            .map(|failure| {
                let zone_id = match failure {
                    ZoneError::NoFiniteReadings { zone_id } => zone_id,
                    ZoneError::TaskFailed { zone_id, .. } => zone_id,
                };
                SkippedZone {
                    zone_id: zone_id.clone(),
                    reason: failure.to_string(),
                }
            })
            .collect();

        RunSummary {
            generated_at: Utc::now(),
            input_rows,
            duplicates_dropped,
            zones_processed: output.zones_processed.len(),
            zones_skipped,
            hourly_rows: output.hourly.len(),
            daily_rows: output.daily.len(),
            hotspot_rows: output.hotspots.len(),
            window_rows: output.windows.len(),
        }
    }

    pub fn zones_skipped(&self) -> usize {
        self.zones_skipped.len()
    }
}
