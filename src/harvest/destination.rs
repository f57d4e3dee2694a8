//! Raw table destinations
//!
//! Every table title maps to one destination. Rows from all seasons are
//! appended to it without a header, so the destination grows by exactly the
//! rows written each time.

use crate::harvest::record::sanitize_title;
use crate::Result;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Receives repaired table rows
pub trait TableSink: Send {
    /// Appends `rows` to the destination for `title`
    ///
    /// # Returns
    ///
    /// The name of the destination written to
    fn append(&mut self, title: &str, rows: &[Vec<String>]) -> Result<String>;
}

/// Appends rows to `<dir>/<sanitized title>.csv`
#[derive(Debug)]
pub struct CsvDestinations {
    dir: PathBuf,
    rows_written: BTreeMap<String, usize>,
}

impl CsvDestinations {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            rows_written: BTreeMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the destination for a title
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sanitize_title(title)))
    }

    /// Rows written per destination during this run
    pub fn rows_written(&self) -> &BTreeMap<String, usize> {
        &self.rows_written
    }
}

impl TableSink for CsvDestinations {
    fn append(&mut self, title: &str, rows: &[Vec<String>]) -> Result<String> {
        fs::create_dir_all(&self.dir)?;

        let name = sanitize_title(title);
        let path = self.path_for(title);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        *self.rows_written.entry(name.clone()).or_insert(0) += rows.len();
        tracing::debug!("Appended {} rows to {}", rows.len(), path.display());

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_append_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scraped_data");
        let mut sink = CsvDestinations::new(&out);

        let name = sink
            .append("American League Team Standings", &[row(&["1901", "Chicago"])])
            .unwrap();

        assert_eq!(name, "American_League_Team_Standings");
        assert!(out.join("American_League_Team_Standings.csv").exists());
    }

    #[test]
    fn test_append_grows_by_rows_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvDestinations::new(dir.path());

        sink.append("Pitcher Review", &[row(&["1901", "a"]), row(&["1901", "b"])])
            .unwrap();
        sink.append("Pitcher Review", &[row(&["1902", "c"])]).unwrap();

        let rows = crate::clean::read_raw(&sink.path_for("Pitcher Review")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], row(&["1902", "c"]));
        assert_eq!(sink.rows_written()["Pitcher_Review"], 3);
    }

    #[test]
    fn test_append_quotes_cells_with_separators() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvDestinations::new(dir.path());

        sink.append(
            "Player Review",
            &[row(&["1927", "Home Runs", "Ruth, Babe", "60"]), row(&["1927", "RBI"])],
        )
        .unwrap();

        let path = sink.path_for("Player Review");
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1927,Home Runs,\"Ruth, Babe\",60\n1927,RBI\n");

        let rows = crate::clean::read_raw(&path).unwrap();
        assert_eq!(rows[0][2], "Ruth, Babe");
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn test_titles_differing_in_punctuation_share_destination() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvDestinations::new(dir.path());
        assert_eq!(
            sink.path_for("Hitting Leaders."),
            sink.path_for("Hitting Leaders")
        );
    }
}
