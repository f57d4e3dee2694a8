//! Interactive SQL shell over the store
//!
//! Lines are buffered until one ends with `;`, then the whole statement is
//! run. SQL errors are printed and the loop carries on; `exit;` or end of
//! input leaves the shell.

use crate::storage::Store;
use std::io::{self, BufRead, Write};

pub const PROMPT: &str = "sql> ";
pub const CONTINUATION_PROMPT: &str = "   -> ";

/// Reads statements from `input` and writes results to `output`
pub struct QueryShell<'a, S: Store> {
    store: &'a mut S,
}

impl<'a, S: Store> QueryShell<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Prints the table list and a short banner
    pub fn greet<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "The tables in this database are:")?;
        match self.store.table_names() {
            Ok(names) => {
                for name in names {
                    writeln!(output, "{}", name)?;
                }
            }
            Err(e) => writeln!(output, "SQL Error: {}", e)?,
        }
        writeln!(
            output,
            "Enter SQL statements below, ending with a semicolon. Type 'exit;' to quit."
        )
    }

    /// Runs the read-eval-print loop until `exit;` or end of input
    ///
    /// # Returns
    ///
    /// The number of statements executed, failed ones included
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<usize> {
        let mut buffer: Vec<String> = Vec::new();
        let mut executed = 0;
        let mut lines = input.lines();

        loop {
            let prompt = if buffer.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            write!(output, "{}", prompt)?;
            output.flush()?;

            let Some(line) = lines.next() else {
                writeln!(output)?;
                writeln!(output, "Exiting.")?;
                break;
            };
            let line = line?;
            let trimmed = line.trim();

            if trimmed.eq_ignore_ascii_case("exit;") {
                writeln!(output, "Exiting.")?;
                break;
            }

            let complete = trimmed.ends_with(';');
            buffer.push(line);
            if !complete {
                continue;
            }

            let statement = buffer.join(" ");
            buffer.clear();
            executed += 1;
            self.execute(statement.trim(), output)?;
        }

        Ok(executed)
    }

    fn execute<W: Write>(&mut self, statement: &str, output: &mut W) -> io::Result<()> {
        tracing::debug!("Executing: {}", statement);
        match self.store.query(statement) {
            Ok(result) => {
                for row in result.rows {
                    writeln!(output, "({})", row.join(", "))?;
                }
                Ok(())
            }
            Err(e) => writeln!(output, "SQL Error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use std::io::Cursor;

    fn run_script(store: &mut SqliteStore, script: &str) -> (usize, String) {
        let mut shell = QueryShell::new(store);
        let mut out = Vec::new();
        let executed = shell.run(Cursor::new(script), &mut out).unwrap();
        (executed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_multiline_statement() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let (executed, out) = run_script(
            &mut store,
            "CREATE TABLE t (x INTEGER, y TEXT);\nINSERT INTO t\nVALUES (1, 'a');\nSELECT * FROM t;\nexit;\n",
        );

        assert_eq!(executed, 3);
        assert!(out.contains("   -> "));
        assert!(out.contains("(1, a)"));
        assert!(out.ends_with("Exiting.\n"));
    }

    #[test]
    fn test_sql_error_keeps_loop_running() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let (executed, out) = run_script(&mut store, "SELECT * FROM nope;\nSELECT 2;\n");

        assert_eq!(executed, 2);
        assert!(out.contains("SQL Error: SQLite error: no such table: nope"));
        assert!(out.contains("(2)"));
    }

    #[test]
    fn test_eof_exits_and_drops_partial_statement() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let (executed, out) = run_script(&mut store, "SELECT 1");

        assert_eq!(executed, 0);
        assert!(out.ends_with("\nExiting.\n"));
    }

    #[test]
    fn test_greet_lists_tables() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let shell = QueryShell::new(&mut store);
        let mut out = Vec::new();
        shell.greet(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("runs"));
        assert!(text.contains("year_outcomes"));
    }
}
