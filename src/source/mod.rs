//! Input seam for the acquisition collaborator.
//!
//! [`ReadingSource`] is the async trait the pipeline loads its input table
//! through. [`CsvFileSource`] implements it for a CSV file on disk.

mod csv_file;

pub use csv_file::CsvFileSource;

use async_trait::async_trait;

use crate::analyzers::types::Reading;
use crate::error::Result;

/// Produces the raw reading table (unordered, duplicates allowed).
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Reading>>;

    /// Human-readable origin, used in log fields.
    fn describe(&self) -> String;
}

/// A fixed in-memory table, useful when readings are already materialized.
pub struct StaticSource(pub Vec<Reading>);

#[async_trait]
impl ReadingSource for StaticSource {
    async fn load(&self) -> Result<Vec<Reading>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} rows)", self.0.len())
    }
}
