//! Output module for exporting harvested records
//!
//! This module handles:
//! - Writing model crawls to CSV and SQLite sinks
//! - Summarizing a harvest as statistics
//! - Rendering crawl progress

mod csv_output;
pub mod progress;
mod schema;
mod sqlite_output;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use progress::{render_progress, spawn_progress_logger};
pub use schema::initialize_schema;
pub use sqlite_output::SqliteSink;
pub use stats::{print_statistics, HarvestStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::crawler::ModelCrawl;

/// Writes every model crawl to every sink, then finishes each sink
///
/// Crawls are written in the order given. The first sink error aborts.
pub fn write_all(crawls: &[ModelCrawl], sinks: &mut [Box<dyn RecordSink>]) -> OutputResult<()> {
    for sink in sinks.iter_mut() {
        for crawl in crawls {
            sink.write_model(crawl)?;
        }
        sink.finish()?;
    }
    Ok(())
}
