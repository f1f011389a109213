use crate::config::EmptyValuePolicy;
use crate::types::{Row, SeedValue};
use once_cell::sync::Lazy;
use regex::Regex;

/// Column names that usually hold dates: containing "data" or "date", or starting with "dt"
static DATE_LIKE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)data|date|^dt").unwrap());

pub fn is_date_like(column: &str) -> bool {
    DATE_LIKE_REGEX.is_match(column)
}

/// Apply the run's empty-value policy to a reconciled row
pub fn normalize(mut row: Row, policy: EmptyValuePolicy) -> Row {
    match policy {
        EmptyValuePolicy::IgnoreEmpty => {
            row.retain(|_, value| !value.is_empty());
        }
        EmptyValuePolicy::NullBlankDateLike => {
            for (column, value) in row.iter_mut() {
                if value.is_empty_string() && is_date_like(column) {
                    *value = SeedValue::Null;
                }
            }
        }
    }
    row
}
