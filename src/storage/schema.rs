//! Database schema definitions
//!
//! The run journal lives next to the imported datasets in the same SQLite
//! file. Dataset tables are created on import and are not part of this schema.

/// SQL schema for the run journal
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Final state of every year a run processed
CREATE TABLE IF NOT EXISTS year_outcomes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    year INTEGER NOT NULL,
    url TEXT NOT NULL,
    state TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    tables_written INTEGER NOT NULL DEFAULT 0,
    error TEXT,
    UNIQUE(run_id, year)
);

CREATE INDEX IF NOT EXISTS idx_year_outcomes_run ON year_outcomes(run_id);
CREATE INDEX IF NOT EXISTS idx_year_outcomes_state ON year_outcomes(state);
"#;

/// Tables owned by the journal; never replaced by a dataset import
pub const JOURNAL_TABLES: &[&str] = &["runs", "year_outcomes"];

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
