//! Time-anchored rolling statistics.
//!
//! Windows are defined by elapsed wall-clock time, not row count: the window
//! ending at `t` covers `(t - span, t]`, so gaps shrink the sample without
//! moving the boundary.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::analyzers::types::{CleanedReading, FeaturedReading};
use crate::analyzers::utility::{mean, median};
use crate::config::{PipelineConfig, WindowSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStat {
    Mean,
    Median,
}

/// Computes `stat` over a trailing time window for every position.
///
/// `timestamps` must be ascending. Missing or non-finite values do not count
/// toward `min_periods`; positions whose window holds fewer observations are
/// `None`.
pub fn rolling_window(
    timestamps: &[DateTime<Utc>],
    values: &[Option<f64>],
    window: WindowSpec,
    stat: RollingStat,
) -> Vec<Option<f64>> {
    debug_assert_eq!(timestamps.len(), values.len());

    let mut out = Vec::with_capacity(values.len());
    let mut start = 0;
    let mut sample = Vec::new();

    for (end, ts) in timestamps.iter().enumerate() {
        let lower = *ts - window.span;
        while start <= end && timestamps[start] <= lower {
            start += 1;
        }

        sample.clear();
        sample.extend(
            values[start..=end]
                .iter()
                .flatten()
                .copied()
                .filter(|v| v.is_finite()),
        );

        if sample.len() < window.min_periods.max(1) {
            out.push(None);
            continue;
        }

        out.push(match stat {
            RollingStat::Mean => mean(&sample),
            RollingStat::Median => median(&sample),
        });
    }

    out
}

/// Attaches the 24h mean, 168h mean and 24h median of `temp_c_clean` to a
/// single zone's cleaned series (ascending by timestamp).
#[tracing::instrument(skip_all, fields(rows = cleaned.len()))]
pub fn featurize_zone(cleaned: Vec<CleanedReading>, config: &PipelineConfig) -> Vec<FeaturedReading> {
    let timestamps: Vec<_> = cleaned.iter().map(|c| c.reading.timestamp).collect();
    let values: Vec<_> = cleaned.iter().map(|c| Some(c.temp_c_clean)).collect();

    let roll24_mean = rolling_window(&timestamps, &values, config.roll24_mean, RollingStat::Mean);
    let roll168_mean = rolling_window(&timestamps, &values, config.roll168_mean, RollingStat::Mean);
    let roll24_median = rolling_window(
        &timestamps,
        &values,
        config.roll24_median,
        RollingStat::Median,
    );

    let undefined_168 = roll168_mean.iter().filter(|v| v.is_none()).count();
    debug!(undefined_168, "Rolling features computed");

    cleaned
        .into_iter()
        .zip(roll24_mean)
        .zip(roll168_mean)
        .zip(roll24_median)
        .map(|(((cleaned, roll24_mean), roll168_mean), roll24_median)| FeaturedReading {
            cleaned,
            roll24_mean,
            roll168_mean,
            roll24_median,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hourly(n: i64) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        (0..n).map(|h| start + Duration::hours(h)).collect()
    }

    #[test]
    fn test_undefined_until_min_periods() {
        let ts = hourly(8);
        let values: Vec<_> = (0..8).map(|v| Some(v as f64)).collect();
        let out = rolling_window(&ts, &values, WindowSpec::hours(24, 6), RollingStat::Mean);
        assert!(out[..5].iter().all(Option::is_none));
        assert_eq!(out[5], Some(2.5));
        assert_eq!(out[7], Some(3.5));
    }

    #[test]
    fn test_window_is_time_anchored() {
        // 3h window: the reading exactly 3h earlier falls outside.
        let ts = hourly(5);
        let values: Vec<_> = [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().map(Some).collect();
        let out = rolling_window(&ts, &values, WindowSpec::hours(3, 1), RollingStat::Mean);
        assert_eq!(out[4], Some(4.0));
    }

    #[test]
    fn test_gap_shrinks_sample() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let ts = vec![
            start,
            start + Duration::hours(1),
            start + Duration::hours(2),
            start + Duration::hours(30),
        ];
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(10.0)];
        let out = rolling_window(&ts, &values, WindowSpec::hours(24, 1), RollingStat::Median);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(10.0));
    }

    #[test]
    fn test_missing_values_do_not_count() {
        let ts = hourly(4);
        let values = vec![Some(1.0), None, None, Some(3.0)];
        let out = rolling_window(&ts, &values, WindowSpec::hours(24, 3), RollingStat::Mean);
        assert!(out.iter().all(Option::is_none));

        let out = rolling_window(&ts, &values, WindowSpec::hours(24, 2), RollingStat::Mean);
        assert_eq!(out[3], Some(2.0));
    }

    #[test]
    fn test_median_of_even_window() {
        let ts = hourly(4);
        let values: Vec<_> = [4.0, 1.0, 3.0, 2.0].into_iter().map(Some).collect();
        let out = rolling_window(&ts, &values, WindowSpec::hours(24, 4), RollingStat::Median);
        assert_eq!(out[3], Some(2.5));
    }
}
