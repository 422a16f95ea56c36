use chrono::{DateTime, Utc};

use crate::analyzers::types::NormalizedReading;

/// Hourly coverage of one zone's normalized input series.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ZoneCoverage {
    pub zone_id: String,
    pub readings: usize,
    pub missing_temps: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    /// Hourly slots from `first` to `last`, both inclusive.
    pub expected_hours: usize,
}

impl ZoneCoverage {
    /// `readings` must belong to one zone and be ascending by timestamp.
    pub fn from_zone(zone_id: &str, readings: &[NormalizedReading]) -> Self {
        let first = readings.first().map(|r| r.timestamp);
        let last = readings.last().map(|r| r.timestamp);
        let expected_hours = match (first, last) {
            (Some(first), Some(last)) => (last - first).num_hours().max(0) as usize + 1,
            _ => 0,
        };

        ZoneCoverage {
            zone_id: zone_id.to_string(),
            readings: readings.len(),
            missing_temps: readings.iter().filter(|r| r.temp_c.is_none()).count(),
            first,
            last,
            expected_hours,
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share (0.0–1.0) of expected hourly slots holding a usable temperature.
    pub fn coverage(&self) -> f64 {
        Self::pct(self.readings - self.missing_temps, self.expected_hours) / 100.0
    }

    pub fn coverage_pct(&self) -> f64 {
        Self::pct(self.readings - self.missing_temps, self.expected_hours)
    }
}

/// Coverage of every zone in a normalized table, in zone order.
pub fn coverage_report(readings: &[NormalizedReading]) -> Vec<ZoneCoverage> {
    readings
        .chunk_by(|a, b| a.zone_id == b.zone_id)
        .map(|rows| ZoneCoverage::from_zone(&rows[0].zone_id, rows))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::normalize::normalize;
    use crate::analyzers::types::Reading;
    use chrono::{Duration, TimeZone};

    fn reading(zone: &str, hour: i64, temp: Option<f64>) -> Reading {
        Reading {
            zone_id: zone.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            temp_c: temp,
        }
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(ZoneCoverage::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(ZoneCoverage::pct(50, 100), 50.0);
        assert_eq!(ZoneCoverage::pct(1, 4), 25.0);
    }

    #[test]
    fn test_coverage_counts_gaps_and_missing() {
        // Slots 0..=9 expected; 3 rows present, one of them blank.
        let rows = normalize(vec![
            reading("a", 0, Some(1.0)),
            reading("a", 4, None),
            reading("a", 9, Some(2.0)),
        ]);
        let cov = ZoneCoverage::from_zone("a", &rows);
        assert_eq!(cov.expected_hours, 10);
        assert_eq!(cov.missing_temps, 1);
        assert_eq!(cov.coverage_pct(), 20.0);
    }

    #[test]
    fn test_coverage_report_per_zone() {
        let rows = normalize(vec![
            reading("b", 0, Some(1.0)),
            reading("a", 0, Some(1.0)),
            reading("a", 1, Some(1.0)),
        ]);
        let report = coverage_report(&rows);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].zone_id, "a");
        assert_eq!(report[0].coverage(), 1.0);
        assert_eq!(report[1].readings, 1);
    }

    #[test]
    fn test_empty_zone_coverage() {
        let cov = ZoneCoverage::from_zone("a", &[]);
        assert_eq!(cov.expected_hours, 0);
        assert_eq!(cov.coverage(), 0.0);
    }
}
