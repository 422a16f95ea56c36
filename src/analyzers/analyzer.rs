use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::analyzers::aggregate::{aggregate_daily, zone_retention};
use crate::analyzers::clean::clean_zone;
use crate::analyzers::hotspot::detect_hotspots;
use crate::analyzers::normalize::normalize;
use crate::analyzers::rank::rank_windows;
use crate::analyzers::rolling::featurize_zone;
use crate::analyzers::seasonal::decompose_zone;
use crate::analyzers::types::{NormalizedReading, PipelineOutput, RunSummary, ZoneOutput};
use crate::config::PipelineConfig;
use crate::error::{Result, ZoneError};
use crate::source::ReadingSource;
use crate::stats::coverage_report;

/// Runs every stage after normalization for one zone.
///
/// `readings` must all carry `zone_id` and be ascending by timestamp.
pub fn process_zone(
    zone_id: &str,
    readings: Vec<NormalizedReading>,
    config: &PipelineConfig,
) -> std::result::Result<ZoneOutput, ZoneError> {
    let cleaned = clean_zone(zone_id, readings, config)?;
    let featured = featurize_zone(cleaned, config);
    let hourly = decompose_zone(featured, config);
    let daily = aggregate_daily(zone_id, &hourly, config);
    let hotspots = detect_hotspots(&hourly, config.hotspot_quantile);
    let windows = rank_windows(zone_id, &hourly, zone_retention(&daily));

    debug!(
        hourly = hourly.len(),
        daily = daily.len(),
        hotspots = hotspots.len(),
        windows = windows.len(),
        "Zone processed"
    );

    Ok(ZoneOutput {
        zone_id: zone_id.to_string(),
        hourly,
        daily,
        hotspots,
        windows,
    })
}

/// Splits a normalized table (sorted by zone) into contiguous per-zone runs.
pub fn partition_by_zone(readings: Vec<NormalizedReading>) -> Vec<(String, Vec<NormalizedReading>)> {
    let mut zones: Vec<(String, Vec<NormalizedReading>)> = Vec::new();
    for r in readings {
        match zones.last_mut() {
            Some((zone_id, rows)) if *zone_id == r.zone_id => rows.push(r),
            _ => zones.push((r.zone_id.clone(), vec![r])),
        }
    }
    zones
}

/// Processes every zone as its own task, at most `concurrency` at a time.
///
/// Zone results are concatenated in zone order. A zone that fails is logged
/// and recorded in [`PipelineOutput::failures`] without affecting the others.
pub async fn run_zones(
    readings: Vec<NormalizedReading>,
    config: Arc<PipelineConfig>,
    concurrency: usize,
) -> PipelineOutput {
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency.max(1)));
    let mut tasks = vec![];

    for (zone_id, rows) in partition_by_zone(readings) {
        let sem = semaphore.clone();
        let config = config.clone();
        let zone_span = tracing::info_span!("process_zone", zone_id = %zone_id, rows = rows.len());
        let task_zone = zone_id.clone();

        // CPU-bound; runs on the blocking pool while the permit is held.
        let task = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await;
            tokio::task::spawn_blocking(move || {
                let _entered = zone_span.enter();
                process_zone(&task_zone, rows, &config)
            })
            .await
        });

        tasks.push((zone_id, task));
    }

    let mut output = PipelineOutput::default();
    for (zone_id, task) in tasks {
        match task.await.and_then(|joined| joined) {
            Ok(Ok(zone)) => output.push_zone(zone),
            Ok(Err(e)) => {
                warn!(zone_id = %zone_id, error = %e, "Zone skipped");
                output.failures.push(e);
            }
            Err(e) => {
                error!(zone_id = %zone_id, error = %e, "Zone task failed");
                output.failures.push(ZoneError::TaskFailed {
                    zone_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    output
}

/// Loads the input table from `source`, normalizes it and runs all zones.
///
/// Only input-level failures (schema, malformed rows, I/O) are returned as
/// errors; zone-level failures are reported in the summary.
#[tracing::instrument(skip_all, fields(source = %source.describe(), concurrency = concurrency))]
pub async fn run_pipeline<S: ReadingSource + ?Sized>(
    source: &S,
    config: Arc<PipelineConfig>,
    concurrency: usize,
) -> Result<(PipelineOutput, RunSummary)> {
    config.validate()?;

    let readings = source.load().await?;
    let input_rows = readings.len();
    let normalized = normalize(readings);
    let duplicates_dropped = input_rows - normalized.len();
    info!(input_rows, duplicates_dropped, "Input table loaded");

    for coverage in coverage_report(&normalized) {
        if coverage.coverage() < config.min_coverage {
            warn!(
                zone_id = %coverage.zone_id,
                coverage_pct = coverage.coverage_pct(),
                missing_temps = coverage.missing_temps,
                "Zone has low hourly coverage"
            );
        }
    }

    let output = run_zones(normalized, config, concurrency).await;
    let summary = RunSummary::new(&output, input_rows, duplicates_dropped);

    info!(
        zones_processed = summary.zones_processed,
        zones_skipped = summary.zones_skipped(),
        hourly_rows = summary.hourly_rows,
        "Pipeline complete"
    );

    Ok((output, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Reading;
    use chrono::{Duration, TimeZone, Utc};

    fn readings(zone: &str, hours: i64, temp: impl Fn(i64) -> Option<f64>) -> Vec<Reading> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        (0..hours)
            .map(|h| Reading {
                zone_id: zone.to_string(),
                timestamp: start + Duration::hours(h),
                temp_c: temp(h),
            })
            .collect()
    }

    #[test]
    fn test_partition_by_zone() {
        let mut rows = readings("a", 3, |_| Some(1.0));
        rows.extend(readings("b", 2, |_| Some(1.0)));
        let zones = partition_by_zone(normalize(rows));
        let sizes: Vec<(&str, usize)> = zones.iter().map(|(z, r)| (z.as_str(), r.len())).collect();
        assert_eq!(sizes, vec![("a", 3), ("b", 2)]);
    }

    #[test]
    fn test_process_zone_produces_every_table() {
        let rows = normalize(readings("a", 72, |h| Some(20.0 + (h % 24) as f64)));
        let out = process_zone("a", rows, &PipelineConfig::default()).unwrap();
        assert_eq!(out.hourly.len(), 72);
        assert_eq!(out.daily.len(), 3);
        assert_eq!(out.windows.len(), 24);
        assert!(!out.hotspots.is_empty());
        // Day 1 has no prior afternoon; days 2 and 3 do.
        assert!(out.daily[0].night_retention.is_none());
        assert!(out.daily[1].night_retention.is_some());
    }

    #[tokio::test]
    async fn test_run_zones_skips_failed_zone() {
        let mut rows = readings("a", 48, |h| Some(20.0 + (h % 3) as f64));
        rows.extend(readings("b", 48, |_| None));
        rows.extend(readings("c", 48, |h| Some(25.0 + (h % 3) as f64)));

        let output = run_zones(normalize(rows), Arc::new(PipelineConfig::default()), 2).await;

        assert_eq!(output.zones_processed, vec!["a", "c"]);
        assert_eq!(
            output.failures,
            vec![ZoneError::NoFiniteReadings {
                zone_id: "b".to_string()
            }]
        );
        assert_eq!(output.hourly.len(), 96);
        assert!(output.hourly[..48].iter().all(|r| r.zone_id == "a"));
        assert!(output.hourly[48..].iter().all(|r| r.zone_id == "c"));
    }

    #[tokio::test]
    async fn test_run_zones_empty_input() {
        let output = run_zones(Vec::new(), Arc::new(PipelineConfig::default()), 4).await;
        assert!(output.hourly.is_empty());
        assert!(output.failures.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_run_zones_wider_than_runtime() {
        let zones = ["a", "b", "c", "d"];
        let mut rows = Vec::new();
        for (i, zone) in zones.iter().enumerate() {
            rows.extend(readings(zone, 96, |h| Some(20.0 + i as f64 + (h % 24) as f64 * 0.5)));
        }
        let rows = normalize(rows);
        let config = Arc::new(PipelineConfig::default());

        let output = run_zones(rows.clone(), config.clone(), 16).await;

        assert_eq!(output.zones_processed, zones);
        assert!(output.failures.is_empty());
        let mut expected = PipelineOutput::default();
        for (zone_id, zone_rows) in partition_by_zone(rows) {
            expected.push_zone(process_zone(&zone_id, zone_rows, &config).unwrap());
        }
        assert_eq!(output.hourly, expected.hourly);
        assert_eq!(output.windows, expected.windows);
    }
}
