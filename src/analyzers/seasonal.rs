//! Hour-of-week baseline removal.

use std::collections::HashMap;

use crate::analyzers::types::{FeaturedReading, HourlyRecord};
use crate::config::PipelineConfig;

/// Mean `temp_c_clean` per (weekday, hour) slot of a single zone.
pub fn seasonal_baseline(rows: &[FeaturedReading]) -> HashMap<(u32, u32), f64> {
    let mut sums: HashMap<(u32, u32), (f64, usize)> = HashMap::new();
    for row in rows {
        let r = &row.cleaned.reading;
        let slot = sums.entry((r.weekday, r.hour)).or_insert((0.0, 0));
        slot.0 += row.cleaned.temp_c_clean;
        slot.1 += 1;
    }

    sums.into_iter()
        .map(|(key, (sum, n))| (key, sum / n as f64))
        .collect()
}

/// Joins the baseline back onto every row and produces the final hourly table.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn decompose_zone(rows: Vec<FeaturedReading>, config: &PipelineConfig) -> Vec<HourlyRecord> {
    let baseline = seasonal_baseline(&rows);

    rows.into_iter()
        .map(|row| {
            let FeaturedReading {
                cleaned,
                roll24_mean,
                roll168_mean,
                roll24_median,
            } = row;
            let r = cleaned.reading;
            // Every row contributed to its own slot, so the lookup cannot miss.
            let seasonal_mean = baseline[&(r.weekday, r.hour)];

            HourlyRecord {
                is_night: config.is_night(r.hour),
                deseasonalized: cleaned.temp_c_clean - seasonal_mean,
                seasonal_mean,
                zone_id: r.zone_id,
                timestamp: r.timestamp,
                temp_c: r.temp_c,
                temp_c_clean: cleaned.temp_c_clean,
                is_outlier: cleaned.is_outlier,
                roll24_mean,
                roll168_mean,
                roll24_median,
                date: r.date,
                hour: r.hour,
                weekday: r.weekday,
                month: r.month,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{CleanedReading, NormalizedReading};
    use chrono::{Datelike, Duration, TimeZone, Timelike, Utc};

    fn featured(hours: i64, temp: impl Fn(i64) -> f64) -> Vec<FeaturedReading> {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        (0..hours)
            .map(|h| {
                let ts = start + Duration::hours(h);
                FeaturedReading {
                    cleaned: CleanedReading {
                        reading: NormalizedReading {
                            zone_id: "z".to_string(),
                            timestamp: ts,
                            temp_c: Some(temp(h)),
                            date: ts.date_naive(),
                            hour: ts.hour(),
                            weekday: ts.weekday().num_days_from_monday(),
                            month: ts.month(),
                        },
                        is_outlier: false,
                        temp_c_clean: temp(h),
                    },
                    roll24_mean: None,
                    roll168_mean: None,
                    roll24_median: None,
                }
            })
            .collect()
    }

    #[test]
    fn test_baseline_averages_same_slot_across_weeks() {
        // Two weeks: week 1 at 20.0, week 2 at 24.0.
        let rows = featured(24 * 14, |h| if h < 24 * 7 { 20.0 } else { 24.0 });
        let baseline = seasonal_baseline(&rows);
        assert_eq!(baseline.len(), 7 * 24);
        assert_eq!(baseline[&(0, 13)], 22.0);
    }

    #[test]
    fn test_deseasonalized_is_residual() {
        let rows = featured(24 * 14, |h| if h < 24 * 7 { 20.0 } else { 24.0 });
        let hourly = decompose_zone(rows, &PipelineConfig::default());
        assert_eq!(hourly[0].seasonal_mean, 22.0);
        assert_eq!(hourly[0].deseasonalized, -2.0);
        assert_eq!(hourly[24 * 7].deseasonalized, 2.0);
    }

    #[test]
    fn test_is_night_flag() {
        let hourly = decompose_zone(featured(24, |_| 20.0), &PipelineConfig::default());
        let night: Vec<u32> = hourly.iter().filter(|r| r.is_night).map(|r| r.hour).collect();
        assert_eq!(night, vec![0, 1, 2, 3, 4, 5, 21, 22, 23]);
    }
}
