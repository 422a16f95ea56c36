use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::analyzers::types::{DailyAggregate, HourlyRecord};
use crate::analyzers::utility::mean;
use crate::config::PipelineConfig;

#[derive(Default)]
struct DayAccumulator {
    temps: Vec<f64>,
    deseasonalized: Vec<f64>,
    outliers: usize,
}

/// Rolls a single zone's hourly table up to one [`DailyAggregate`] per date,
/// including night heat retention.
#[tracing::instrument(skip_all, fields(zone_id = zone_id, rows = hourly.len()))]
pub fn aggregate_daily(
    zone_id: &str,
    hourly: &[HourlyRecord],
    config: &PipelineConfig,
) -> Vec<DailyAggregate> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for row in hourly {
        let day = days.entry(row.date).or_default();
        day.temps.push(row.temp_c_clean);
        day.deseasonalized.push(row.deseasonalized);
        if row.is_outlier {
            day.outliers += 1;
        }
    }

    let retention = night_retention(hourly, config);

    days.into_iter()
        .filter_map(|(date, day)| {
            let n = day.temps.len() as f64;
            Some(DailyAggregate {
                zone_id: zone_id.to_string(),
                date,
                mean_temp_c: mean(&day.temps)?,
                max_temp_c: day.temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                min_temp_c: day.temps.iter().copied().fold(f64::INFINITY, f64::min),
                mean_deseasonalized: mean(&day.deseasonalized)?,
                prop_outliers: day.outliers as f64 / n,
                night_retention: retention.get(&date).copied().flatten(),
            })
        })
        .collect()
}

/// Night average of each date minus the afternoon average of the prior date.
///
/// Only dates with night readings appear; the value is `None` when the prior
/// date has no afternoon readings.
pub fn night_retention(
    hourly: &[HourlyRecord],
    config: &PipelineConfig,
) -> BTreeMap<NaiveDate, Option<f64>> {
    let mut night: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    let mut afternoon: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for row in hourly {
        if row.is_night {
            night.entry(row.date).or_default().push(row.temp_c_clean);
        }
        if config.is_afternoon(row.hour) {
            afternoon.entry(row.date).or_default().push(row.temp_c_clean);
        }
    }

    let retention: BTreeMap<NaiveDate, Option<f64>> = night
        .into_iter()
        .map(|(date, temps)| {
            let prior_afternoon = date
                .pred_opt()
                .and_then(|prior| afternoon.get(&prior))
                .and_then(|temps| mean(temps));
            let value = mean(&temps)
                .zip(prior_afternoon)
                .map(|(night_avg, aft_avg)| night_avg - aft_avg);
            (date, value)
        })
        .collect();

    debug!(
        nights = retention.len(),
        paired = retention.values().filter(|v| v.is_some()).count(),
        "Night retention computed"
    );

    retention
}

/// Mean of the defined daily retention values of one zone.
pub fn zone_retention(daily: &[DailyAggregate]) -> Option<f64> {
    let values: Vec<f64> = daily.iter().filter_map(|d| d.night_retention).collect();
    mean(&values)
}
