//! Output sink trait and errors
//!
//! A sink receives finished model crawls; how they are encoded is up to the
//! implementation.

use crate::crawler::ModelCrawl;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives every model's records once its crawl has ended
///
/// Partial crawls are written too; their outcome tells them apart.
pub trait RecordSink {
    /// Writes the records of one model
    fn write_model(&mut self, crawl: &ModelCrawl) -> OutputResult<()>;

    /// Flushes buffered output; called once after the last model
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
