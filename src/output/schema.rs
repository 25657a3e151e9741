//! Database schema for the SQLite export
//!
//! One row per export run, one row per crawled model in that run, and one
//! row per listing of that model. Listing columns follow record order.

/// SQL schema for the export database
pub const SCHEMA_SQL: &str = r#"
-- Track export runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL
);

-- One crawled model per run
CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    title TEXT,
    announced_total INTEGER,
    pages INTEGER NOT NULL,
    outcome TEXT NOT NULL,
    error TEXT
);

CREATE INDEX IF NOT EXISTS idx_models_run ON models(run_id);

-- Extracted listings, in page order
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model_id INTEGER NOT NULL REFERENCES models(id),
    position INTEGER NOT NULL,
    brand TEXT NOT NULL,
    title TEXT NOT NULL,
    body_type TEXT NOT NULL,
    year TEXT NOT NULL,
    distance TEXT NOT NULL,
    displacement TEXT NOT NULL,
    inspection_expiry TEXT NOT NULL,
    repair_history TEXT NOT NULL,
    color TEXT NOT NULL,
    price TEXT NOT NULL,
    monthly_payment TEXT NOT NULL,
    location TEXT NOT NULL,
    review_score TEXT NOT NULL,
    review_count TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_model ON listings(model_id);
"#;

/// Inserts one listing; parameters are model id, position, then the 14 fields
pub const INSERT_LISTING_SQL: &str = "INSERT INTO listings (
    model_id, position, brand, title, body_type, year, distance, displacement,
    inspection_expiry, repair_history, color, price, monthly_payment, location,
    review_score, review_count
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
