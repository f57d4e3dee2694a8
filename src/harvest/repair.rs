//! Era repair rules
//!
//! Older season pages omit columns that later seasons carry, so their
//! standings tables line up with nothing downstream. Each rule inserts one
//! placeholder column for a year range and a set of table titles. Rules run
//! in table order, then every table gets its `Year` column at position 0.

use crate::harvest::record::TableRecord;
use thiserror::Error;

/// Titles of the league's standings tables
pub const AMERICAN_LEAGUE_TITLES: &[&str] = &[
    "American League",
    "American League Standings",
    "American League Team Standings",
];

/// Title of the team standings table alone
pub const TEAM_STANDINGS_TITLES: &[&str] = &["American League Team Standings"];

#[derive(Debug, Error, PartialEq)]
pub enum RepairError {
    #[error("cannot insert column '{column}' at {index}: table has {width} columns")]
    PositionOutOfRange {
        column: &'static str,
        index: usize,
        width: usize,
    },
}

/// Which tables a rule touches
#[derive(Debug, Clone, Copy)]
pub enum TitleSet {
    Any,
    OneOf(&'static [&'static str]),
}

impl TitleSet {
    fn contains(&self, title: &str) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(titles) => titles.contains(&title),
        }
    }
}

/// Where the new column goes
#[derive(Debug, Clone, Copy)]
pub enum Position {
    Index(usize),
    End,
}

/// What the new column is filled with
#[derive(Debug, Clone, Copy)]
pub enum Filler {
    /// `"<column> placeholder"`
    Placeholder,
    /// The season year
    Year,
}

/// One column insertion, applied when year and title both match
#[derive(Debug, Clone, Copy)]
pub struct EraRule {
    /// Last season (inclusive) the rule applies to; `None` means all seasons
    pub through_year: Option<u16>,
    /// A season inside the range that is exempt
    pub except_year: Option<u16>,
    pub titles: TitleSet,
    pub column: &'static str,
    pub position: Position,
    pub filler: Filler,
}

/// Era repairs, in application order
pub const ERA_RULES: &[EraRule] = &[
    EraRule {
        through_year: Some(1968),
        except_year: None,
        titles: TitleSet::OneOf(AMERICAN_LEAGUE_TITLES),
        column: "Conference",
        position: Position::Index(0),
        filler: Filler::Placeholder,
    },
    EraRule {
        through_year: Some(1980),
        except_year: None,
        titles: TitleSet::OneOf(TEAM_STANDINGS_TITLES),
        column: "Strike Splits",
        position: Position::Index(3),
        filler: Filler::Placeholder,
    },
    EraRule {
        through_year: Some(1984),
        except_year: None,
        titles: TitleSet::OneOf(AMERICAN_LEAGUE_TITLES),
        column: "Payroll",
        position: Position::End,
        filler: Filler::Placeholder,
    },
    EraRule {
        through_year: Some(2002),
        except_year: Some(1928),
        titles: TitleSet::OneOf(AMERICAN_LEAGUE_TITLES),
        column: "Ties",
        position: Position::Index(4),
        filler: Filler::Placeholder,
    },
];

/// Applied to every table after the era rules
pub const YEAR_RULE: EraRule = EraRule {
    through_year: None,
    except_year: None,
    titles: TitleSet::Any,
    column: "Year",
    position: Position::Index(0),
    filler: Filler::Year,
};

impl EraRule {
    /// Returns true if the rule covers this season and title
    pub fn applies(&self, year: u16, title: &str) -> bool {
        let in_range = self.through_year.map_or(true, |last| year <= last);
        let exempt = self.except_year == Some(year);
        in_range && !exempt && self.titles.contains(title)
    }

    /// Inserts the rule's column into `record`
    ///
    /// The record is left untouched when the position is out of range.
    pub fn apply(&self, record: &mut TableRecord) -> Result<(), RepairError> {
        let width = record.width();
        let index = match self.position {
            Position::Index(index) => index,
            Position::End => width,
        };
        if index > width {
            return Err(RepairError::PositionOutOfRange {
                column: self.column,
                index,
                width,
            });
        }

        let value = match self.filler {
            Filler::Placeholder => format!("{} placeholder", self.column),
            Filler::Year => record.year.to_string(),
        };

        record.columns.insert(index, self.column.to_string());
        for row in &mut record.rows {
            let at = index.min(row.len());
            row.insert(at, value.clone());
        }
        Ok(())
    }
}

/// Runs the era rules and then the year rule over one table
///
/// Returns the names of the columns inserted, in order.
pub fn repair_table(record: &mut TableRecord) -> Result<Vec<&'static str>, RepairError> {
    let mut inserted = Vec::new();
    for rule in ERA_RULES.iter().chain(std::iter::once(&YEAR_RULE)) {
        if rule.applies(record.year, &record.title) {
            rule.apply(record)?;
            inserted.push(rule.column);
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::extract::ExtractedTable;

    fn record(title: &str, year: u16, width: usize) -> TableRecord {
        let columns = (0..width).map(|i| format!("c{}", i)).collect();
        let rows = vec![(0..width).map(|i| format!("v{}", i)).collect()];
        TableRecord::new(title, year, ExtractedTable { columns, rows })
    }

    #[test]
    fn test_conference_boundary() {
        let mut early = record("American League Standings", 1968, 6);
        let inserted = repair_table(&mut early).unwrap();
        assert!(inserted.contains(&"Conference"));
        assert_eq!(early.columns[0], "Year");
        assert_eq!(early.columns[1], "Conference");
        assert_eq!(early.rows[0][1], "Conference placeholder");

        let mut late = record("American League Standings", 1969, 6);
        let inserted = repair_table(&mut late).unwrap();
        assert!(!inserted.contains(&"Conference"));
        assert_eq!(late.columns[1], "c0");
    }

    #[test]
    fn test_ties_skipped_for_1928_only() {
        for (year, expect_ties) in [(1927, true), (1928, false), (1929, true)] {
            let mut table = record("American League", year, 8);
            let inserted = repair_table(&mut table).unwrap();
            assert_eq!(
                inserted.contains(&"Ties"),
                expect_ties,
                "unexpected Ties handling for {}",
                year
            );
        }
    }

    #[test]
    fn test_strike_splits_only_for_team_standings() {
        let mut team = record("American League Team Standings", 1975, 8);
        assert!(repair_table(&mut team).unwrap().contains(&"Strike Splits"));

        let mut other = record("American League Standings", 1975, 8);
        assert!(!repair_table(&mut other).unwrap().contains(&"Strike Splits"));

        let mut later = record("American League Team Standings", 1981, 8);
        assert!(!repair_table(&mut later).unwrap().contains(&"Strike Splits"));
    }

    #[test]
    fn test_full_rule_order_for_early_season() {
        let mut table = record("American League Team Standings", 1927, 6);
        let inserted = repair_table(&mut table).unwrap();
        assert_eq!(
            inserted,
            vec!["Conference", "Strike Splits", "Payroll", "Ties", "Year"]
        );
        assert_eq!(table.width(), 11);
        assert_eq!(table.columns.last().unwrap(), "Payroll");
        assert_eq!(table.rows[0][0], "1927");
        assert!(table.rows.iter().all(|r| r.len() == table.width()));
    }

    #[test]
    fn test_year_prepended_to_unrelated_tables() {
        let mut table = record("Pitcher Review", 2010, 3);
        let inserted = repair_table(&mut table).unwrap();
        assert_eq!(inserted, vec!["Year"]);
        assert_eq!(table.rows[0], vec!["2010", "v0", "v1", "v2"]);
    }

    #[test]
    fn test_out_of_range_position_is_error() {
        let mut table = record("American League Team Standings", 1975, 2);
        let err = repair_table(&mut table).unwrap_err();
        assert!(matches!(
            err,
            RepairError::PositionOutOfRange {
                column: "Strike Splits",
                ..
            }
        ));
    }
}
