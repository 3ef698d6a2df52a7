//! Ratio and fee extraction from the provider's tables.
//!
//! Unlike the performance tab, the ratios and fees tabs keep their `<table>`
//! structure stable, so rows and cells are walked directly. Header cells are
//! matched to periods when present; a positional fallback covers the older
//! header-less rendering.

use crate::core::{MetricRecord, MetricValue, Period, parse_decimal_es};
use crate::extract::html::{ascii_lower, next_element, strip_tags, tag_inner};
use crate::extract::labels::{RATIO_COLUMNS, TER_KEYWORDS, contains_word, fold};

/// Pulls a ratio row (Sharpe, volatility, ...) out of the tables of a page,
/// keyed by the periods of the table's header columns. When several rows
/// match the keywords, the last one replaces earlier results outright.
pub fn extract_ratios(html: &str, keywords: &[&str]) -> MetricRecord {
    let lower = ascii_lower(html);
    let mut record = MetricRecord::new();

    for (ts, te) in elements(&lower, "table") {
        let table_lower = &lower[ts..te];
        let table_raw = &html[ts..te];
        let headers = header_periods(table_lower, table_raw);
        if headers.is_empty() {
            continue;
        }
        for (rs, re) in elements(table_lower, "tr") {
            let cells = row_cells(&table_lower[rs..re], &table_raw[rs..re]);
            if cells.len() < headers.len() || !has_keyword_label(&cells, keywords) {
                continue;
            }
            let mut row = MetricRecord::new();
            // Right-anchored: the label cell(s) on the left carry no header.
            for (period, cell) in headers.iter().rev().zip(cells.iter().rev()) {
                if let Some(value) = parse_decimal_es(cell) {
                    row.insert(*period, MetricValue::Number(value));
                }
            }
            record = row;
        }
    }

    if record.is_empty() {
        positional_ratios(html, &lower, keywords, &mut record);
    }
    record
}

/// Header-less rendering: the trailing three cells of a matching row are the
/// one-, three- and five-year columns.
fn positional_ratios(html: &str, lower: &str, keywords: &[&str], record: &mut MetricRecord) {
    const POSITIONAL: [Period; 3] = [Period::OneYear, Period::ThreeYears, Period::FiveYears];

    for (ts, te) in elements(lower, "table") {
        for (rs, re) in elements(&lower[ts..te], "tr") {
            let cells = row_cells(&lower[ts..te][rs..re], &html[ts..te][rs..re]);
            // A label plus the three period columns; anything shorter cannot
            // be aligned.
            if cells.len() < 4 || !is_keyword_row(&cells, keywords) {
                continue;
            }
            let mut row = MetricRecord::new();
            let tail = &cells[cells.len() - 3..];
            for (period, cell) in POSITIONAL.iter().zip(tail) {
                if let Some(value) = parse_decimal_es(cell) {
                    row.insert(*period, MetricValue::Number(value));
                }
            }
            *record = row;
        }
    }
}

/// Ongoing-charges figure from the fees tab, kept verbatim as the provider
/// prints it ("1,25%"). Rows are keyed on their label cell; the last cell of
/// the last matching row wins, `"-"` when no row matches.
pub fn extract_ter(html: &str) -> String {
    let lower = ascii_lower(html);
    let mut ter = None;

    for (ts, te) in elements(&lower, "table") {
        for (rs, re) in elements(&lower[ts..te], "tr") {
            let cells = row_cells(&lower[ts..te][rs..re], &html[ts..te][rs..re]);
            // A row that is only the label has no figure to take.
            if cells.len() < 2 || !has_keyword_label(&cells, TER_KEYWORDS) {
                continue;
            }
            if let Some(last) = cells.last() {
                ter = Some(last.clone());
            }
        }
    }
    ter.unwrap_or_else(|| "-".to_string())
}

/// Cell text ready for matching and parsing: markup stripped, entities
/// decoded, whitespace collapsed, and the provider's spellings of "nothing
/// here" unified to `"-"`.
fn sanitize_cell(inner: &str) -> String {
    let text = strip_tags(inner);
    let folded = fold(&text);
    if text.is_empty() || folded == "nan" || folded == "n/a" {
        "-".to_string()
    } else {
        text
    }
}

fn elements<'a>(lower: &'a str, name: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
    let mut from = 0;
    std::iter::from_fn(move || {
        let (start, end) = next_element(lower, name, from)?;
        from = end;
        Some((start, end))
    })
}

/// Periods announced by the table's header row, left to right. Only the
/// first `<tr>` is read; a `<th>` further down is a row label, not a column.
fn header_periods(table_lower: &str, table_raw: &str) -> Vec<Period> {
    let mut periods = Vec::new();
    let Some((rs, re)) = next_element(table_lower, "tr", 0) else {
        return periods;
    };
    let row_lower = &table_lower[rs..re];
    let row_raw = &table_raw[rs..re];
    for (s, e) in elements(row_lower, "th") {
        let text = fold(&sanitize_cell(tag_inner(&row_raw[s..e])));
        let matched = RATIO_COLUMNS
            .iter()
            .find(|spec| spec.variants.iter().any(|v| text.contains(v)));
        if let Some(spec) = matched {
            periods.push(spec.period);
        }
    }
    periods
}

/// Sanitized `<td>`/`<th>` cells of a row in document order. Row labels come
/// as either tag depending on the page vintage.
fn row_cells(row_lower: &str, row_raw: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut from = 0;
    loop {
        let td = next_element(row_lower, "td", from);
        let th = next_element(row_lower, "th", from);
        let block = match (td, th) {
            (Some(a), Some(b)) => {
                if a.0 < b.0 {
                    a
                } else {
                    b
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        cells.push(sanitize_cell(tag_inner(&row_raw[block.0..block.1])));
        from = block.1;
    }
    cells
}

/// Whether the row's label cell, its first cell, names one of the keywords.
/// A mention elsewhere in the row does not make it a metric row.
fn has_keyword_label(cells: &[String], keywords: &[&str]) -> bool {
    let Some(label) = cells.first() else {
        return false;
    };
    let text = fold(label);
    keywords.iter().any(|k| contains_word(&text, k))
}

/// Row-wide match for the header-less fallback, where the older rendering
/// splits the label across cells.
fn is_keyword_row(cells: &[String], keywords: &[&str]) -> bool {
    let text = fold(&cells.join(" "));
    keywords.iter().any(|k| contains_word(&text, k))
}
