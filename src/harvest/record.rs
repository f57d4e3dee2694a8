//! Table records and title handling
//!
//! A table's title decides which destination its rows land in, so titles are
//! normalised twice: once to drop the season prefix the site puts on some
//! headings, and once more to turn the result into a file-safe name.

use crate::harvest::extract::ExtractedTable;

/// Title used when a table carries no heading at all
pub const UNKNOWN_TABLE: &str = "UnknownTable";

/// Longest destination name, in characters
pub const MAX_DESTINATION_NAME: usize = 50;

/// One extracted table tagged with its cleaned title and season
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub title: String,
    pub year: u16,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableRecord {
    pub fn new(title: impl Into<String>, year: u16, table: ExtractedTable) -> Self {
        Self {
            title: title.into(),
            year,
            columns: table.columns,
            rows: table.rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Strips a leading season prefix from a table title
///
/// Only an exact match of the year at the start is removed; the remainder is
/// trimmed of spaces, dots and dashes. Titles without the prefix come back
/// unchanged, so cleaning is idempotent.
///
/// # Example
///
/// ```
/// use almanac_scraper::clean_title;
///
/// assert_eq!(clean_title("1991 Standings", 1991), "Standings");
/// assert_eq!(clean_title("Standings", 1991), "Standings");
/// ```
pub fn clean_title(title: &str, year: u16) -> String {
    let prefix = year.to_string();
    match title.strip_prefix(prefix.as_str()) {
        Some(rest) => rest.trim_matches(|c| c == ' ' || c == '.' || c == '-').to_string(),
        None => title.to_string(),
    }
}

/// Maps a table title to its destination name
///
/// Spaces become underscores, slashes and pipes are dropped along with any
/// other non-word character, and the result is cut to
/// [`MAX_DESTINATION_NAME`] characters. A title with nothing left maps to
/// [`UNKNOWN_TABLE`].
///
/// # Example
///
/// ```
/// use almanac_scraper::sanitize_title;
///
/// assert_eq!(sanitize_title("American League Team Standings"), "American_League_Team_Standings");
/// assert_eq!(sanitize_title("American League / Standings"), "American_League__Standings");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let name: String = title
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .take(MAX_DESTINATION_NAME)
        .collect();

    if name.is_empty() {
        UNKNOWN_TABLE.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_year_prefix() {
        assert_eq!(clean_title("1991 Standings", 1991), "Standings");
        assert_eq!(
            clean_title("1927 American League Team Standings", 1927),
            "American League Team Standings"
        );
        assert_eq!(clean_title("1950 - Pitcher Review", 1950), "Pitcher Review");
    }

    #[test]
    fn test_clean_title_is_idempotent() {
        assert_eq!(clean_title("Standings", 1991), "Standings");
        let once = clean_title("1991 Standings", 1991);
        assert_eq!(clean_title(&once, 1991), once);
    }

    #[test]
    fn test_clean_title_other_year_untouched() {
        assert_eq!(clean_title("1990 Standings", 1991), "1990 Standings");
    }

    #[test]
    fn test_sanitize_title_property() {
        let name = sanitize_title("American League / Standings");
        assert!(name.chars().all(|c| c.is_alphanumeric() || c == '_'));
        assert!(!name.contains('/'));
        assert!(!name.contains('|'));
        assert!(name.chars().count() <= MAX_DESTINATION_NAME);
    }

    #[test]
    fn test_sanitize_title_strips_pipes_and_punctuation() {
        assert_eq!(sanitize_title("Hitting | Pitching"), "Hitting__Pitching");
        assert_eq!(
            sanitize_title("American League Player Review"),
            "American_League_Player_Review"
        );
        assert_eq!(sanitize_title("Fielding (Team)"), "Fielding_Team");
    }

    #[test]
    fn test_sanitize_title_truncates() {
        let long = "A".repeat(80);
        assert_eq!(sanitize_title(&long).chars().count(), MAX_DESTINATION_NAME);
    }

    #[test]
    fn test_sanitize_title_empty_falls_back() {
        assert_eq!(sanitize_title("///"), UNKNOWN_TABLE);
        assert_eq!(sanitize_title(""), UNKNOWN_TABLE);
    }
}
