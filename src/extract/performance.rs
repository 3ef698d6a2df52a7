//! Cumulative-returns extraction from the performance tab.
//!
//! The page is flattened to text first; tag structure on this tab has changed
//! more than once while the visible wording stayed put, so matching works on
//! the normalized text: locate the "rentabilidades acumuladas" block, then
//! for each known row label capture the first number that follows it.

use crate::core::{
    ExtractionFailure, ExtractionTrace, LabelMatch, MetricRecord, MetricValue, parse_decimal_es,
};
use crate::extract::html::normalize_html;
use crate::extract::labels::{
    ACCUMULATED_MARKER, ACCUMULATED_TERMINATORS, PERFORMANCE_LABELS, fold, numeric_shaped,
};

/// Length, in characters, of the diagnostic excerpts kept in a trace.
pub const EXCERPT_LEN: usize = 600;

/// How many tokens after a label are inspected for its value. Covers label
/// suffixes landing in their own token and cells split across markup; the
/// scan also ends early at an empty-cell dash or the next row's label.
const VALUE_WINDOW: usize = 4;

/// Pulls the cumulative-returns figures out of raw page HTML.
///
/// Never fails: on any shortfall the record is simply smaller and the trace
/// says why. Excerpts of the raw and normalized page are attached only when
/// nothing at all was extracted.
pub fn extract_performance(html: &str) -> (MetricRecord, ExtractionTrace) {
    let mut record = MetricRecord::new();
    let mut trace = ExtractionTrace::default();

    if html.trim().is_empty() {
        trace.reason = Some(ExtractionFailure::EmptyHtml);
        return (record, trace);
    }

    let text = normalize_html(html);
    if text.is_empty() {
        trace.reason = Some(ExtractionFailure::EmptyText);
        trace.raw_excerpt = Some(excerpt(html));
        return (record, trace);
    }

    let folded = fold(&text);
    let (block, block_found) = accumulated_block(&folded);
    trace.block_found = block_found;

    for spec in PERFORMANCE_LABELS {
        let mut captured = false;
        for variant in spec.variants {
            let Some(pos) = find_label(block, variant) else {
                continue;
            };
            let Some(raw) = first_numeric_token(&block[pos + variant.len()..]) else {
                // The wording is present but the figure is not next to this
                // occurrence; another variant may sit closer to it.
                continue;
            };
            captured = true;
            trace.matched.push(LabelMatch {
                label: spec.period.to_string(),
                variant: (*variant).to_string(),
                raw: raw.clone(),
            });
            if let Some(value) = parse_decimal_es(&raw) {
                record.insert(spec.period, MetricValue::Number(value));
            }
            break;
        }
        // A period lands in exactly one bucket: a capture that failed
        // conversion stays in `matched` with its raw text.
        if !captured {
            trace.unmatched.push(spec.period.to_string());
        }
    }

    if record.is_empty() {
        trace.reason = Some(if block_found {
            ExtractionFailure::ValuesNotFound
        } else {
            ExtractionFailure::BlockNotFound
        });
        trace.raw_excerpt = Some(excerpt(html));
        trace.text_excerpt = Some(excerpt(&text));
    }

    (record, trace)
}

/// Slice of the folded text holding the cumulative-returns rows; falls back
/// to the whole text when the heading is missing.
fn accumulated_block(folded: &str) -> (&str, bool) {
    match find_label(folded, ACCUMULATED_MARKER) {
        Some(pos) => {
            let tail = &folded[pos + ACCUMULATED_MARKER.len()..];
            let end = ACCUMULATED_TERMINATORS
                .iter()
                .filter_map(|t| tail.find(t))
                .min()
                .unwrap_or(tail.len());
            (&tail[..end], true)
        }
        None => (folded, false),
    }
}

/// Substring search that refuses matches glued to a preceding letter or
/// digit, so "1 año" is not found inside "21 años".
fn find_label(block: &str, variant: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = block[from..].find(variant) {
        let pos = from + rel;
        if block[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
        {
            return Some(pos);
        }
        from = pos + variant.len();
    }
    None
}

/// First figure among the tokens following a label, or `None` when the row
/// carries none. A bare dash is the provider's empty cell and ends the
/// search, as does any other digit-bearing token: a bare integer here is the
/// next row's label ordinal or a year heading, never a figure. Plain words
/// and stray `:`/`=`/`%` fragments are stepped over.
fn first_numeric_token(after: &str) -> Option<String> {
    for token in after.split_whitespace().take(VALUE_WINDOW) {
        let token = token.trim_start_matches([':', '=']);
        if token.is_empty() || token == "%" {
            continue;
        }
        if is_placeholder(token) {
            return None;
        }
        if numeric_shaped(token) && !token.bytes().all(|b| b.is_ascii_digit()) {
            return Some(token.to_string());
        }
        if token.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    None
}

/// The dash glyphs the provider prints for a cell with no data.
fn is_placeholder(token: &str) -> bool {
    matches!(token, "-" | "\u{2013}" | "\u{2014}" | "\u{2212}")
}

fn excerpt(s: &str) -> String {
    s.chars().take(EXCERPT_LEN).collect()
}
