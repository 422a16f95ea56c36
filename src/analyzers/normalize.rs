//! Sorting, deduplication and calendar derivation for raw readings.

use chrono::{Datelike, Timelike};
use tracing::debug;

use crate::analyzers::types::{NormalizedReading, Reading};

/// Sorts readings by (zone_id, timestamp), keeps the first occurrence of each
/// (zone_id, timestamp) pair in input order, and derives date/hour/weekday/month.
///
/// Applying it to its own output returns the same table.
pub fn normalize(mut readings: Vec<Reading>) -> Vec<NormalizedReading> {
    let input_rows = readings.len();

    // Stable, so the earliest duplicate in input order survives dedup.
    readings.sort_by(|a, b| {
        a.zone_id
            .cmp(&b.zone_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
    readings.dedup_by(|later, kept| {
        later.zone_id == kept.zone_id && later.timestamp == kept.timestamp
    });

    debug!(
        input_rows,
        output_rows = readings.len(),
        duplicates_dropped = input_rows - readings.len(),
        "Readings normalized"
    );

    readings.into_iter().map(derive_calendar).collect()
}

fn derive_calendar(r: Reading) -> NormalizedReading {
    let date = r.timestamp.date_naive();
    NormalizedReading {
        hour: r.timestamp.hour(),
        weekday: r.timestamp.weekday().num_days_from_monday(),
        month: r.timestamp.month(),
        date,
        zone_id: r.zone_id,
        timestamp: r.timestamp,
        temp_c: r.temp_c.filter(|t| t.is_finite()),
    }
}
