//! Policy constants for the pipeline stages.
//!
//! Defaults reproduce the reference output; the CLI may override the outlier
//! threshold and hotspot quantile.

use chrono::Duration;

use crate::error::{PipelineError, Result};

/// A trailing wall-clock window together with its minimum observation count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub span: Duration,
    pub min_periods: usize,
}

impl WindowSpec {
    pub fn hours(hours: i64, min_periods: usize) -> Self {
        Self {
            span: Duration::hours(hours),
            min_periods,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Scale applied to the robust z-score so it approximates a normal z.
    pub z_scale: f64,
    /// |z| strictly above this marks an outlier.
    pub z_threshold: f64,
    /// Rolling median used to substitute outliers.
    pub clean_window: WindowSpec,
    pub roll24_mean: WindowSpec,
    pub roll168_mean: WindowSpec,
    pub roll24_median: WindowSpec,
    /// Hours counted as night for heat retention.
    pub night_hours: Vec<u32>,
    /// Hours of the prior day counted as afternoon for heat retention.
    pub afternoon_hours: Vec<u32>,
    pub hotspot_quantile: f64,
    /// Zones below this share of expected hourly slots are logged with a warning.
    pub min_coverage: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            z_scale: 0.6745,
            z_threshold: 3.5,
            clean_window: WindowSpec::hours(24, 6),
            roll24_mean: WindowSpec::hours(24, 6),
            roll168_mean: WindowSpec::hours(168, 24),
            roll24_median: WindowSpec::hours(24, 6),
            night_hours: vec![21, 22, 23, 0, 1, 2, 3, 4, 5],
            afternoon_hours: vec![15, 16, 17, 18],
            hotspot_quantile: 0.95,
            min_coverage: 0.85,
        }
    }
}

impl PipelineConfig {
    pub fn with_z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = threshold;
        self
    }

    pub fn with_hotspot_quantile(mut self, quantile: f64) -> Self {
        self.hotspot_quantile = quantile;
        self
    }

    pub fn is_night(&self, hour: u32) -> bool {
        self.night_hours.contains(&hour)
    }

    pub fn is_afternoon(&self, hour: u32) -> bool {
        self.afternoon_hours.contains(&hour)
    }

    /// Rejects settings that would make a stage meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.hotspot_quantile) {
            return Err(PipelineError::InvalidConfig(format!(
                "hotspot quantile must be within [0, 1], got {}",
                self.hotspot_quantile
            )));
        }
        if !(self.z_threshold.is_finite() && self.z_threshold > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "z threshold must be positive, got {}",
                self.z_threshold
            )));
        }
        let windows = [
            self.clean_window,
            self.roll24_mean,
            self.roll168_mean,
            self.roll24_median,
        ];
        if windows.iter().any(|w| w.span <= Duration::zero()) {
            return Err(PipelineError::InvalidConfig(
                "rolling windows must span a positive duration".to_string(),
            ));
        }
        if self.night_hours.iter().chain(&self.afternoon_hours).any(|h| *h > 23) {
            return Err(PipelineError::InvalidConfig(
                "night and afternoon hours must be within 0..=23".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_night_hours() {
        let cfg = PipelineConfig::default();
        for h in [21, 22, 23, 0, 1, 2, 3, 4, 5] {
            assert!(cfg.is_night(h), "hour {h} should be night");
        }
        for h in 6..=20 {
            assert!(!cfg.is_night(h), "hour {h} should not be night");
        }
    }

    #[test]
    fn test_rejects_quantile_out_of_range() {
        let cfg = PipelineConfig::default().with_hotspot_quantile(1.5);
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let cfg = PipelineConfig::default().with_z_threshold(0.0);
        assert!(cfg.validate().is_err());
    }
}
