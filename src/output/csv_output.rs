//! CSV export
//!
//! All models go into one file: a `model` column holding the model title,
//! followed by the 14 record fields in column order.

use crate::crawler::ModelCrawl;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::record::FIELD_NAMES;
use std::fs::File;
use std::io::Write;
use std::iter;
use std::path::Path;

/// Writes records as CSV rows
pub struct CsvSink<W: Write = File> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvSink<File> {
    /// Creates (or truncates) the CSV file at `path` and writes the header
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps any writer and writes the header row
    pub fn from_writer(inner: W) -> OutputResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(iter::once("model").chain(FIELD_NAMES))?;
        Ok(Self { writer, rows: 0 })
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_model(&mut self, crawl: &ModelCrawl) -> OutputResult<()> {
        let model = crawl.display_title();
        for record in &crawl.records {
            self.writer
                .write_record(iter::once(model).chain(record.fields()))?;
            self.rows += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
