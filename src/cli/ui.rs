use crate::core::MetricValue;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats one metric slot. Numbers are color coded by sign, anything the
/// extractor could not provide renders as a dim "-".
pub fn metric_cell(value: Option<&MetricValue>) -> Cell {
    match value {
        Some(value) if value.is_placeholder() => placeholder_cell(),
        Some(MetricValue::Number(v)) => {
            let color = if *v >= 0.0 { Color::Green } else { Color::Red };
            Cell::new(format!("{v:.2}"))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
        Some(MetricValue::Text(text)) => Cell::new(text).set_alignment(CellAlignment::Right),
        None => placeholder_cell(),
    }
}

/// Cell for the TER column, which stays a provider-formatted string.
pub fn ter_cell(ter: &str) -> Cell {
    if ter == "-" {
        placeholder_cell()
    } else {
        Cell::new(ter).set_alignment(CellAlignment::Right)
    }
}

fn placeholder_cell() -> Cell {
    Cell::new("-")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Creates a spinner for operations without a known length.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
