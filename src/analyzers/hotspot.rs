use tracing::debug;

use crate::analyzers::types::{HourlyRecord, Hotspot};
use crate::analyzers::utility::quantile;

/// Selects every hour of a single zone whose `deseasonalized` value is at or
/// above the zone's `q` quantile. Ties at the threshold are all kept.
#[tracing::instrument(skip_all, fields(rows = hourly.len(), q = q))]
pub fn detect_hotspots(hourly: &[HourlyRecord], q: f64) -> Vec<Hotspot> {
    let residuals: Vec<f64> = hourly.iter().map(|r| r.deseasonalized).collect();
    let Some(threshold) = quantile(&residuals, q) else {
        return Vec::new();
    };

    let hotspots: Vec<Hotspot> = hourly
        .iter()
        .filter(|r| r.deseasonalized >= threshold)
        .map(|r| Hotspot {
            timestamp: r.timestamp,
            zone_id: r.zone_id.clone(),
            temp_c: r.temp_c_clean,
            deseasonalized: r.deseasonalized,
            hour: r.hour,
            weekday: r.weekday,
        })
        .collect();

    debug!(threshold, selected = hotspots.len(), "Hotspots extracted");
    hotspots
}
