use std::collections::BTreeMap;

use crate::analyzers::types::{HourlyRecord, InterventionWindow};
use crate::analyzers::utility::{dense_rank, mean};

/// Ranks the hours of day of a single zone as mitigation windows.
///
/// Hours are dense-ranked by average temperature and by average residual
/// (both ascending); the score is the mean of the two ranks. The result is
/// sorted by (score, hour), best window first.
pub fn rank_windows(
    zone_id: &str,
    hourly: &[HourlyRecord],
    night_retention: Option<f64>,
) -> Vec<InterventionWindow> {
    let mut by_hour: BTreeMap<u32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in hourly {
        let (temps, residuals) = by_hour.entry(row.hour).or_default();
        temps.push(row.temp_c_clean);
        residuals.push(row.deseasonalized);
    }

    let stats: Vec<(u32, f64, f64)> = by_hour
        .into_iter()
        .filter_map(|(hour, (temps, residuals))| Some((hour, mean(&temps)?, mean(&residuals)?)))
        .collect();

    let avg_temps: Vec<f64> = stats.iter().map(|s| s.1).collect();
    let avg_residuals: Vec<f64> = stats.iter().map(|s| s.2).collect();
    let rank_coolest = dense_rank(&avg_temps);
    let rank_low_deseason = dense_rank(&avg_residuals);

    let mut windows: Vec<InterventionWindow> = stats
        .into_iter()
        .zip(rank_coolest)
        .zip(rank_low_deseason)
        .map(
            |(((hour, avg_temp, avg_deseasonalized), rank_coolest), rank_low_deseason)| {
                InterventionWindow {
                    zone_id: zone_id.to_string(),
                    hour,
                    avg_temp,
                    avg_deseasonalized,
                    night_retention,
                    rank_coolest,
                    rank_low_deseason,
                    suggested_window_score: f64::from(rank_coolest + rank_low_deseason) / 2.0,
                }
            },
        )
        .collect();

    windows.sort_by(|a, b| {
        a.suggested_window_score
            .total_cmp(&b.suggested_window_score)
            .then_with(|| a.hour.cmp(&b.hour))
    });

    windows
}
