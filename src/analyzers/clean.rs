//! Robust outlier flagging and gap filling for one zone.
//!
//! Outliers are flagged per (zone, calendar month) with a MAD-based z-score
//! and replaced by the trailing 24h median of the same partition. Remaining
//! gaps are filled across the whole zone: back-fill first, then forward-fill.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::rolling::{RollingStat, rolling_window};
use crate::analyzers::types::{CleanedReading, NormalizedReading};
use crate::analyzers::utility::median;
use crate::config::PipelineConfig;
use crate::error::ZoneError;

/// Robust z-score `scale * (x - median) / MAD` over the present values.
///
/// Missing inputs yield `None`. When MAD is zero or non-finite every position
/// gets a z-score of zero, so nothing in the partition can be flagged.
pub fn robust_z(values: &[Option<f64>], scale: f64) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();

    let mad = median(&present).and_then(|med| {
        let deviations: Vec<f64> = present.iter().map(|x| (x - med).abs()).collect();
        median(&deviations).map(|mad| (med, mad))
    });

    match mad {
        Some((med, mad)) if mad.is_finite() && mad != 0.0 => values
            .iter()
            .map(|v| v.map(|x| scale * (x - med) / mad))
            .collect(),
        _ => vec![Some(0.0); values.len()],
    }
}

/// Flags outliers and produces a gap-free `temp_c_clean` for one zone.
///
/// `readings` must belong to a single zone and be ascending by timestamp.
#[tracing::instrument(skip_all, fields(zone_id = zone_id, rows = readings.len()))]
pub fn clean_zone(
    zone_id: &str,
    readings: Vec<NormalizedReading>,
    config: &PipelineConfig,
) -> Result<Vec<CleanedReading>, ZoneError> {
    let mut partitions: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, r) in readings.iter().enumerate() {
        partitions.entry(r.month).or_default().push(i);
    }

    let mut is_outlier = vec![false; readings.len()];
    let mut substituted: Vec<Option<f64>> = readings.iter().map(|r| r.temp_c).collect();

    for (month, indices) in &partitions {
        let temps: Vec<Option<f64>> = indices.iter().map(|&i| readings[i].temp_c).collect();
        let timestamps: Vec<_> = indices.iter().map(|&i| readings[i].timestamp).collect();

        let z = robust_z(&temps, config.z_scale);
        let rolling_median = rolling_window(
            &timestamps,
            &temps,
            config.clean_window,
            RollingStat::Median,
        );

        let mut flagged = 0usize;
        for (k, &i) in indices.iter().enumerate() {
            if z[k].is_some_and(|z| z.abs() > config.z_threshold) {
                is_outlier[i] = true;
                substituted[i] = rolling_median[k];
                flagged += 1;
            }
        }

        debug!(month, rows = indices.len(), flagged, "Partition cleaned");
    }

    let filled = fill_gaps(&substituted).ok_or_else(|| ZoneError::NoFiniteReadings {
        zone_id: zone_id.to_string(),
    })?;

    Ok(readings
        .into_iter()
        .zip(is_outlier)
        .zip(filled)
        .map(|((reading, is_outlier), temp_c_clean)| CleanedReading {
            reading,
            is_outlier,
            temp_c_clean,
        })
        .collect())
}

/// Back-fills each gap from the next present value, then forward-fills what
/// remains (trailing gaps) from the previous one. `None` when nothing is present.
pub fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let mut out = values.to_vec();

    let mut next = None;
    for v in out.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }

    let mut prev = None;
    for v in out.iter_mut() {
        match v {
            Some(x) => prev = Some(*x),
            None => *v = prev,
        }
    }

    out.into_iter().collect()
}
