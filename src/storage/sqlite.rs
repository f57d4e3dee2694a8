//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::clean::Frame;
use crate::harvest::YearOutcome;
use crate::state::YearState;
use crate::storage::schema::{initialize_schema, JOURNAL_TABLES};
use crate::storage::traits::{StorageError, StorageResult, Store};
use crate::storage::{ColumnType, ImportReport, OutcomeRecord, QueryOutput, RunRecord, RunStatus};
use crate::ScrapeError;
use chrono::Utc;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(ScrapeError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScrapeError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ScrapeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Quotes an identifier for use in DDL and queries
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renames repeated headers to `name.1`, `name.2`, ...
///
/// SQLite compares column names without case, so `Team` and `team` count as
/// a repeat.
pub fn unique_column_names(headers: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    headers
        .iter()
        .map(|header| {
            let mut name = header.clone();
            let mut suffix = 0;
            while !taken.insert(name.to_lowercase()) {
                suffix += 1;
                name = format!("{}.{}", header, suffix);
            }
            name
        })
        .collect()
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn to_sql_value(value: &str, column_type: ColumnType) -> Value {
    if value.is_empty() {
        return Value::Null;
    }
    match column_type {
        ColumnType::Integer => value
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(value.to_string())),
        ColumnType::Real => value
            .parse::<f64>()
            .map(Value::Real)
            .unwrap_or_else(|_| Value::Text(value.to_string())),
        ColumnType::Text => Value::Text(value.to_string()),
    }
}

impl Store for SqliteStore {
    // ===== Run Journal =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn record_outcomes(&mut self, run_id: i64, outcomes: &[YearOutcome]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO year_outcomes
                 (run_id, year, url, state, attempts, tables_written, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for outcome in outcomes {
                stmt.execute(params![
                    run_id,
                    outcome.year,
                    outcome.url,
                    outcome.state.to_db_string(),
                    outcome.attempts,
                    outcome.tables_written() as i64,
                    outcome.error,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, year, url, state, attempts, tables_written, error
             FROM year_outcomes WHERE run_id = ?1 ORDER BY year",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                Ok(OutcomeRecord {
                    run_id: row.get(0)?,
                    year: row.get(1)?,
                    url: row.get(2)?,
                    state: YearState::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(YearState::Abandoned),
                    attempts: row.get(4)?,
                    tables_written: row.get(5)?,
                    error: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_outcomes_by_state(&self, run_id: i64) -> StorageResult<HashMap<YearState, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT state, COUNT(*) FROM year_outcomes WHERE run_id = ?1 GROUP BY state",
        )?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (state, count) = row?;
            if let Some(state) = YearState::from_db_string(&state) {
                counts.insert(state, count as u64);
            }
        }

        Ok(counts)
    }

    // ===== Datasets =====

    fn replace_table(
        &mut self,
        table: &str,
        frame: &Frame,
        required: &[&str],
    ) -> StorageResult<ImportReport> {
        if JOURNAL_TABLES.contains(&table) {
            return Err(StorageError::ReservedTable(table.to_string()));
        }

        let required_indexes = required
            .iter()
            .map(|name| {
                frame
                    .column_index(name)
                    .ok_or_else(|| StorageError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows: Vec<&Vec<String>> = frame
            .rows
            .iter()
            .filter(|row| {
                required_indexes
                    .iter()
                    .all(|&i| row.get(i).map_or(false, |v| !v.is_empty()))
            })
            .collect();
        let rows_dropped = frame.rows.len() - rows.len();

        let columns: Vec<(String, ColumnType)> = unique_column_names(&frame.headers)
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let values = rows.iter().map(|row| row[index].as_str());
                (name, ColumnType::infer(values))
            })
            .collect();

        let quoted = quote_identifier(table);
        let definitions = columns
            .iter()
            .map(|(name, ty)| format!("{} {}", quote_identifier(name), ty.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {quoted}; CREATE TABLE {quoted} ({definitions});"
        ))?;
        {
            let mut stmt =
                tx.prepare(&format!("INSERT INTO {} VALUES ({})", quoted, placeholders))?;
            for row in &rows {
                let values = columns
                    .iter()
                    .zip(row.iter())
                    .map(|((_, ty), value)| to_sql_value(value, *ty));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        Ok(ImportReport {
            table: table.to_string(),
            rows_loaded: rows.len(),
            rows_dropped,
            columns,
        })
    }

    fn table_names(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ===== Queries =====

    fn query(&mut self, sql: &str) -> StorageResult<QueryOutput> {
        let mut stmt = self.conn.prepare(sql)?;
        let readonly = stmt.readonly();
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut rendered = Vec::with_capacity(width);
            for index in 0..width {
                rendered.push(render_value(row.get_ref(index)?));
            }
            rows.push(rendered);
        }
        drop(cursor);
        drop(stmt);

        Ok(QueryOutput {
            columns,
            rows,
            changes: if readonly { 0 } else { self.conn.changes() },
        })
    }
}
