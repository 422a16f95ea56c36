use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::ReadingSource;
use crate::analyzers::types::Reading;
use crate::error::Result;
use crate::parser::parse_readings;

/// Reads the input table from a CSV file with `timestamp`, `zone_id` and
/// `temp_c` columns.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReadingSource for CsvFileSource {
    async fn load(&self) -> Result<Vec<Reading>> {
        let bytes = tokio::fs::read(&self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Input file read");
        parse_readings(&bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[tokio::test]
    async fn test_load_csv_file() {
        let path = temp_path("uhi_pipeline_test_source.csv");
        fs::write(
            &path,
            "timestamp,zone_id,temp_c\n2024-07-01 00:00:00,Austin,28.5\n2024-07-01 01:00:00,Austin,\n",
        )
        .unwrap();

        let readings = CsvFileSource::new(&path).load().await.unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].temp_c, Some(28.5));
        assert_eq!(readings[1].temp_c, None);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = CsvFileSource::new(temp_path("uhi_pipeline_test_does_not_exist.csv"));
        assert!(matches!(source.load().await, Err(PipelineError::Io(_))));
    }
}
