//! Error types for the heat-island pipeline.
//!
//! [`PipelineError`] covers failures that abort a run. [`ZoneError`] covers
//! failures confined to a single zone, which the runner logs and skips.

use thiserror::Error;

/// Result type alias for fatal pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort the whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// One or more required input columns are absent.
    #[error("schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A row could not be interpreted (bad timestamp or temperature cell).
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// A pipeline setting is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors confined to one zone's partition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoneError {
    /// The zone has no finite temperature, so gaps cannot be filled.
    #[error("zone {zone_id} has no finite temperature readings")]
    NoFiniteReadings { zone_id: String },

    /// The zone task panicked or was cancelled.
    #[error("zone {zone_id} task failed: {reason}")]
    TaskFailed { zone_id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = PipelineError::Schema {
            missing: vec!["zone_id".to_string(), "temp_c".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "schema error: missing required column(s): zone_id, temp_c"
        );
    }

    #[test]
    fn test_invalid_record_message() {
        let err = PipelineError::InvalidRecord {
            line: 7,
            reason: "bad timestamp".to_string(),
        };
        assert_eq!(err.to_string(), "invalid record on line 7: bad timestamp");
    }

    #[test]
    fn test_zone_error_message() {
        let err = ZoneError::NoFiniteReadings {
            zone_id: "Phoenix".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "zone Phoenix has no finite temperature readings"
        );
    }
}
