//! SQLite export
//!
//! Each sink instance records one run; every model crawl becomes a `models`
//! row with its outcome, and its records become `listings` rows.

use crate::crawler::ModelCrawl;
use crate::output::schema::{initialize_schema, INSERT_LISTING_SQL};
use crate::output::traits::{OutputResult, RecordSink};
use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use std::path::Path;

/// Writes records into a SQLite database
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path` and starts a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration that produced this run
    pub fn open(path: &Path, config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        Self::with_connection(conn, config_hash)
    }

    /// Creates an in-memory database
    pub fn open_in_memory(config_hash: &str) -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, config_hash)
    }

    fn with_connection(conn: Connection, config_hash: &str) -> OutputResult<Self> {
        initialize_schema(&conn)?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash) VALUES (?1, ?2)",
            params![Utc::now().to_rfc3339(), config_hash],
        )?;
        let run_id = conn.last_insert_rowid();
        Ok(Self { conn, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Number of listings stored for this run
    pub fn count_listings(&self) -> OutputResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listings l JOIN models m ON l.model_id = m.id
             WHERE m.run_id = ?1",
            [self.run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordSink for SqliteSink {
    fn write_model(&mut self, crawl: &ModelCrawl) -> OutputResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO models (run_id, url, title, announced_total, pages, outcome, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.run_id,
                crawl.model_url.as_str(),
                crawl.title,
                crawl.total.map(|t| t as i64),
                crawl.pages as i64,
                crawl.outcome.to_db_string(),
                crawl.outcome.error(),
            ],
        )?;
        let model_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(INSERT_LISTING_SQL)?;
            for (position, record) in crawl.records.iter().enumerate() {
                let position = position as i64;
                let fields = record.fields();
                let mut values: Vec<&dyn ToSql> = vec![&model_id, &position];
                values.extend(fields.iter().map(|field| field as &dyn ToSql));
                stmt.execute(values.as_slice())?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Stored {} listings for {}",
            crawl.records.len(),
            crawl.display_title()
        );
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.conn.execute(
            "UPDATE runs SET finished_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), self.run_id],
        )?;
        Ok(())
    }
}
