//! HTML table extraction
//!
//! Turns one `<table>` element into a rectangular grid of strings. Header
//! rows come from `<thead>` or from leading rows made only of `<th>` cells;
//! `colspan`/`rowspan` are expanded so every row ends up the same width.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Spans beyond this are treated as malformed markup
pub const MAX_SPAN: usize = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("no <table> element found")]
    NoTable,

    #[error("table has no rows")]
    NoRows,

    #[error("span of {0} exceeds the limit of {MAX_SPAN}")]
    SpanTooLarge(usize),

    #[error("invalid selector '{0}'")]
    Selector(&'static str),
}

/// A rectangular table: one header name per column, rows of equal width
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extracts a table element
///
/// Only rows that belong to `table` itself are read; rows of nested tables
/// are left to their own extraction.
pub fn extract_table(table: ElementRef<'_>) -> Result<ExtractedTable, ExtractError> {
    let row_selector = selector("tr")?;

    let mut spans = SpanGrid::default();
    let mut header_rows: Vec<Vec<String>> = Vec::new();
    let mut body_rows: Vec<Vec<String>> = Vec::new();

    for row in table.select(&row_selector) {
        if !owned_by(row, table) {
            continue;
        }

        let cells = row_cells(row);
        if cells.is_empty() && !spans.has_pending() {
            continue;
        }

        let in_thead = section_of(row) == Some("thead");
        let all_th = !cells.is_empty() && cells.iter().all(|c| c.is_header);
        let expanded = spans.expand(cells)?;

        if in_thead || (body_rows.is_empty() && all_th) {
            header_rows.push(expanded);
        } else {
            body_rows.push(expanded);
        }
    }

    if header_rows.is_empty() && body_rows.is_empty() {
        return Err(ExtractError::NoRows);
    }

    let width = header_rows
        .iter()
        .chain(body_rows.iter())
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    let mut columns = header_rows.pop().unwrap_or_default();
    for index in columns.len()..width {
        columns.push(index.to_string());
    }
    for row in &mut body_rows {
        row.resize(width, String::new());
    }

    Ok(ExtractedTable {
        columns,
        rows: body_rows,
    })
}

/// Extracts the first table of an HTML fragment
pub fn extract_markup(markup: &str) -> Result<ExtractedTable, ExtractError> {
    let fragment = Html::parse_fragment(markup);
    let table_selector = selector("table")?;
    let table = fragment
        .select(&table_selector)
        .next()
        .ok_or(ExtractError::NoTable)?;
    extract_table(table)
}

/// Collapses runs of whitespace and trims
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

struct Cell {
    text: String,
    is_header: bool,
    colspan: usize,
    rowspan: usize,
}

fn row_cells(row: ElementRef<'_>) -> Vec<Cell> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| {
            let name = cell.value().name();
            if name != "td" && name != "th" {
                return None;
            }
            Some(Cell {
                text: normalize_whitespace(&cell.text().collect::<Vec<_>>().join(" ")),
                is_header: name == "th",
                colspan: span_attr(cell, "colspan"),
                rowspan: span_attr(cell, "rowspan"),
            })
        })
        .collect()
}

fn span_attr(cell: ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(1)
}

/// True if the nearest enclosing `<table>` of `row` is `table`
fn owned_by(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .find(|node| matches!(node.value(), Node::Element(e) if e.name() == "table"))
        .map(|node| node.id() == table.id())
        .unwrap_or(false)
}

/// Name of the table section holding `row`, if any
fn section_of(row: ElementRef<'_>) -> Option<&'static str> {
    for node in row.ancestors() {
        if let Node::Element(element) = node.value() {
            match element.name() {
                "thead" => return Some("thead"),
                "tbody" => return Some("tbody"),
                "tfoot" => return Some("tfoot"),
                "table" => return None,
                _ => {}
            }
        }
    }
    None
}

/// Carries rowspan cells down into the rows below them
#[derive(Default)]
struct SpanGrid {
    // column -> (text, rows still to fill)
    pending: Vec<Option<(String, usize)>>,
}

impl SpanGrid {
    fn has_pending(&self) -> bool {
        self.pending.iter().any(Option::is_some)
    }

    fn take_pending(&mut self, column: usize) -> Option<String> {
        let slot = self.pending.get_mut(column)?;
        let (text, remaining) = slot.as_mut()?;
        let text = text.clone();
        *remaining -= 1;
        if *remaining == 0 {
            *slot = None;
        }
        Some(text)
    }

    fn expand(&mut self, cells: Vec<Cell>) -> Result<Vec<String>, ExtractError> {
        let mut out = Vec::new();
        let mut column = 0;

        for cell in cells {
            while let Some(text) = self.take_pending(column) {
                out.push(text);
                column += 1;
            }

            if cell.colspan > MAX_SPAN {
                return Err(ExtractError::SpanTooLarge(cell.colspan));
            }
            if cell.rowspan > MAX_SPAN {
                return Err(ExtractError::SpanTooLarge(cell.rowspan));
            }

            for _ in 0..cell.colspan {
                if cell.rowspan > 1 {
                    if self.pending.len() <= column {
                        self.pending.resize(column + 1, None);
                    }
                    self.pending[column] = Some((cell.text.clone(), cell.rowspan - 1));
                }
                out.push(cell.text.clone());
                column += 1;
            }
        }

        while self.pending.iter().skip(column).any(Option::is_some) {
            out.push(self.take_pending(column).unwrap_or_default());
            column += 1;
        }

        Ok(out)
    }
}
