//! Dashboard views over a cleaned dataset
//!
//! A report filters a cleaned dataset by year, statistic and player, then
//! computes three views:
//!
//! - mean `Statistic Value` per `Statistic Name`, highest first
//! - mean value per year, only when exactly one statistic is selected
//! - the players with the most records
//!
//! Views are rendered as plain text with proportional bars.

use crate::clean::{cleaned_path, CleanError, Frame, STATISTIC_NAME, STATISTIC_VALUE, YEAR};
use crate::config::DatasetEntry;
use crate::output::summary::{OutputError, OutputResult};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::Path;

/// Column holding the player name(s) of a record
pub const PLAYER_COLUMN: &str = "Name(s)";

/// Statistic selected when none is given
pub const DEFAULT_STATISTIC: &str = "Strikeouts";

/// Length of the top players view
pub const TOP_PLAYERS: usize = 10;

const BAR_WIDTH: usize = 40;

/// Row filter for a report; empty lists match everything
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFilter {
    pub years: Vec<i64>,
    pub stats: Vec<String>,
    pub players: Vec<String>,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self {
            years: Vec::new(),
            stats: vec![DEFAULT_STATISTIC.to_string()],
            players: Vec::new(),
        }
    }
}

impl ReportFilter {
    /// Builds a filter from command-line values, defaulting the statistics
    pub fn new(years: Vec<i64>, stats: Vec<String>, players: Vec<String>) -> Self {
        let stats = if stats.is_empty() {
            vec![DEFAULT_STATISTIC.to_string()]
        } else {
            stats
        };
        Self {
            years,
            stats,
            players,
        }
    }

    /// The statistic whose trend is shown, if exactly one is selected
    pub fn single_statistic(&self) -> Option<&str> {
        match self.stats.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Computed views for one filtered dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetReport {
    pub rows_matched: usize,
    pub mean_by_statistic: Vec<(String, f64)>,
    /// Statistic name and its mean per year, ascending by year
    pub mean_over_time: Option<(String, Vec<(i64, f64)>)>,
    /// Player and record count, most records first
    pub top_players: Vec<(String, usize)>,
}

/// Picks a dataset by name, table or label; the first one when `wanted` is None
pub fn select_dataset<'a>(
    datasets: &'a [DatasetEntry],
    wanted: Option<&str>,
) -> OutputResult<&'a DatasetEntry> {
    match wanted {
        None => datasets.first().ok_or(OutputError::NoDatasets),
        Some(wanted) => datasets
            .iter()
            .find(|d| d.name == wanted || d.table == wanted || d.label.as_deref() == Some(wanted))
            .ok_or_else(|| OutputError::UnknownDataset(wanted.to_string())),
    }
}

/// Reads the cleaned file of a dataset into a frame
pub fn load_dataset(cleaned_dir: &Path, dataset: &DatasetEntry) -> Result<Frame, CleanError> {
    let path = cleaned_path(cleaned_dir, dataset);
    Frame::read_csv(&path)
}

/// Applies `filter` to `frame` and computes the views
///
/// # Returns
///
/// * `Ok(Some(DatasetReport))` - At least one row matched
/// * `Ok(None)` - Nothing matched the filter
/// * `Err(CleanError)` - A required column is missing
pub fn build_report(frame: &Frame, filter: &ReportFilter) -> Result<Option<DatasetReport>, CleanError> {
    let year_col = frame.require_column(YEAR)?;
    let name_col = frame.require_column(STATISTIC_NAME)?;
    let value_col = frame.require_column(STATISTIC_VALUE)?;
    let player_col = if filter.players.is_empty() {
        frame.column_index(PLAYER_COLUMN)
    } else {
        Some(frame.require_column(PLAYER_COLUMN)?)
    };

    let matched: Vec<&Vec<String>> = frame
        .rows
        .iter()
        .filter(|row| {
            filter.years.is_empty()
                || row[year_col]
                    .parse::<i64>()
                    .map_or(false, |year| filter.years.contains(&year))
        })
        .filter(|row| filter.stats.is_empty() || filter.stats.contains(&row[name_col]))
        .filter(|row| match player_col {
            Some(col) if !filter.players.is_empty() => filter.players.contains(&row[col]),
            _ => true,
        })
        .collect();

    if matched.is_empty() {
        return Ok(None);
    }

    let mut by_statistic: HashMap<&str, Mean> = HashMap::new();
    for row in &matched {
        if let Ok(value) = row[value_col].parse::<f64>() {
            by_statistic.entry(row[name_col].as_str()).or_default().add(value);
        }
    }
    let mut mean_by_statistic: Vec<(String, f64)> = by_statistic
        .into_iter()
        .map(|(name, mean)| (name.to_string(), mean.value()))
        .collect();
    mean_by_statistic.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mean_over_time = filter.single_statistic().and_then(|stat| {
        let mut by_year: BTreeMap<i64, Mean> = BTreeMap::new();
        for row in matched.iter().filter(|row| row[name_col] == stat) {
            if let (Ok(year), Ok(value)) = (row[year_col].parse::<i64>(), row[value_col].parse::<f64>()) {
                by_year.entry(year).or_default().add(value);
            }
        }
        if by_year.is_empty() {
            return None;
        }
        let points = by_year
            .into_iter()
            .map(|(year, mean)| (year, mean.value()))
            .collect();
        Some((stat.to_string(), points))
    });

    let top_players = match player_col {
        Some(col) => {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for row in &matched {
                *counts.entry(row[col].as_str()).or_insert(0) += 1;
            }
            let mut counts: Vec<(String, usize)> = counts
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            counts.truncate(TOP_PLAYERS);
            counts
        }
        None => Vec::new(),
    };

    Ok(Some(DatasetReport {
        rows_matched: matched.len(),
        mean_by_statistic,
        mean_over_time,
        top_players,
    }))
}

/// Writes the views of a report as text
pub fn render_report<W: Write>(title: &str, report: &DatasetReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "=== American League {} Review ===\n", title)?;
    writeln!(out, "Rows matching filters: {}\n", report.rows_matched)?;

    writeln!(out, "Average Statistic Value by Statistic Name:")?;
    let widest = report
        .mean_by_statistic
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0_f64, f64::max);
    for (name, mean) in &report.mean_by_statistic {
        writeln!(out, "  {:<24} {:>10.2} {}", name, mean, bar(*mean, widest))?;
    }
    writeln!(out)?;

    if let Some((stat, points)) = &report.mean_over_time {
        writeln!(out, "Average {} Over Time:", stat)?;
        let widest = points.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        for (year, mean) in points {
            writeln!(out, "  {} {:>10.2} {}", year, mean, bar(*mean, widest))?;
        }
        writeln!(out)?;
    }

    if !report.top_players.is_empty() {
        writeln!(out, "Top {} by Frequency:", title)?;
        let widest = report.top_players.first().map_or(0, |(_, c)| *c) as f64;
        for (player, count) in &report.top_players {
            writeln!(out, "  {:<32} {:>5} {}", player, count, bar(*count as f64, widest))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Warning printed when a filter matches nothing
pub const NO_MATCH_WARNING: &str =
    "No data matches the selected filters. Adjust --year, --stat or --player.";

fn bar(value: f64, widest: f64) -> String {
    if widest <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / widest) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.max(1))
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        let rows = [
            ["Year", "Statistic Name", "Name(s)", "Statistic Value"],
            ["1920", "Strikeouts", "Walter Johnson", "133"],
            ["1921", "Strikeouts", "Walter Johnson", "143"],
            ["1921", "Strikeouts", "Urban Shocker", "126"],
            ["1920", "Wins", "Jim Bagby", "31"],
            ["1921", "Wins", "Carl Mays", "27"],
            ["1921", "Wins", "Urban Shocker", "27"],
        ];
        Frame::with_header(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn datasets() -> Vec<DatasetEntry> {
        vec![
            DatasetEntry {
                name: "American_League_Pitcher_Review".to_string(),
                table: "pitchers".to_string(),
                label: Some("Pitching (Pitchers)".to_string()),
            },
            DatasetEntry {
                name: "American_League_Player_Review".to_string(),
                table: "players".to_string(),
                label: None,
            },
        ]
    }

    #[test]
    fn test_default_filter_selects_strikeouts() {
        let report = build_report(&frame(), &ReportFilter::default())
            .unwrap()
            .unwrap();

        assert_eq!(report.rows_matched, 3);
        assert_eq!(report.mean_by_statistic.len(), 1);
        assert_eq!(report.mean_by_statistic[0].0, "Strikeouts");

        let (stat, points) = report.mean_over_time.unwrap();
        assert_eq!(stat, "Strikeouts");
        assert_eq!(points, vec![(1920, 133.0), (1921, 134.5)]);

        assert_eq!(report.top_players[0], ("Walter Johnson".to_string(), 2));
    }

    #[test]
    fn test_two_statistics_skip_trend_and_sort_means() {
        let filter = ReportFilter::new(vec![], vec!["Wins".into(), "Strikeouts".into()], vec![]);
        let report = build_report(&frame(), &filter).unwrap().unwrap();

        assert!(report.mean_over_time.is_none());
        let names: Vec<_> = report.mean_by_statistic.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Strikeouts", "Wins"]);
        // Ties on count fall back to name order
        assert_eq!(report.top_players[0].0, "Urban Shocker");
        assert_eq!(report.top_players[1].0, "Walter Johnson");
    }

    #[test]
    fn test_year_and_player_filters() {
        let filter = ReportFilter::new(vec![1921], vec!["Wins".into()], vec!["Carl Mays".into()]);
        let report = build_report(&frame(), &filter).unwrap().unwrap();

        assert_eq!(report.rows_matched, 1);
        assert_eq!(report.mean_by_statistic, vec![("Wins".to_string(), 27.0)]);
    }

    #[test]
    fn test_no_match_is_none() {
        let filter = ReportFilter::new(vec![1999], vec![], vec![]);
        assert!(build_report(&frame(), &filter).unwrap().is_none());
    }

    #[test]
    fn test_missing_column_is_error() {
        let frame = Frame::with_header(vec![vec!["Year".to_string()]]).unwrap();
        let err = build_report(&frame, &ReportFilter::default()).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn(c) if c == STATISTIC_NAME));
    }

    #[test]
    fn test_select_dataset() {
        let datasets = datasets();
        assert_eq!(select_dataset(&datasets, None).unwrap().table, "pitchers");
        assert_eq!(select_dataset(&datasets, Some("players")).unwrap().table, "players");
        assert_eq!(
            select_dataset(&datasets, Some("Pitching (Pitchers)")).unwrap().table,
            "pitchers"
        );
        assert!(matches!(
            select_dataset(&datasets, Some("umpires")),
            Err(OutputError::UnknownDataset(_))
        ));
        assert!(matches!(select_dataset(&[], None), Err(OutputError::NoDatasets)));
    }

    #[test]
    fn test_render_report() {
        let report = build_report(&frame(), &ReportFilter::default())
            .unwrap()
            .unwrap();
        let mut out = Vec::new();
        render_report("Pitching (Pitchers)", &report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Average Strikeouts Over Time:"));
        assert!(text.contains("Top Pitching (Pitchers) by Frequency:"));
        assert!(text.contains(&"#".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_load_dataset_reads_cleaned_file() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = &datasets()[0];
        let f = frame();
        f.write_csv(&cleaned_path(dir.path(), dataset)).unwrap();

        let loaded = load_dataset(dir.path(), dataset).unwrap();
        assert_eq!(loaded, f);
    }
}
