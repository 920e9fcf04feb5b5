// Utility functions
use chrono::{Datelike, NaiveDate};

/// Day ordinal used on chart date axes: 0001-01-01 is 1.0.
pub fn date_num(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Parses a table number such as `"-1,234.50"`. Thousands separators are ignored.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Collapses inner whitespace runs and trims, the way cell text is compared.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
