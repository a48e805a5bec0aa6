use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
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

/// Right aligned decimal rounded to `dp` places, trailing zeros kept.
pub fn decimal_cell(value: Decimal, dp: u32) -> Cell {
    Cell::new(format_decimal(value, dp)).set_alignment(CellAlignment::Right)
}

/// Bold green decimal for the headline value of a row.
pub fn amount_cell(value: Decimal, dp: u32) -> Cell {
    decimal_cell(value, dp)
        .add_attribute(Attribute::Bold)
        .fg(Color::Green)
}

/// Right aligned decimal rounded to `digits` significant digits.
pub fn significant_cell(value: Decimal, digits: u32) -> Cell {
    Cell::new(format_significant(value, digits)).set_alignment(CellAlignment::Right)
}

pub fn format_significant(value: Decimal, digits: u32) -> String {
    value.round_sf(digits).unwrap_or(value).normalize().to_string()
}

pub fn format_decimal(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp(dp);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Creates a cell for "N/A" values, with error-specific styling.
pub fn na_cell(has_error: bool) -> Cell {
    let color = if has_error {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new("N/A").fg(color)
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}"
    };

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
