use crate::error::{AnalyticsError, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// "YYYY-MM" label of the calendar month containing `date`.
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn day_of_month(date: NaiveDate) -> f64 {
    date.day() as f64
}

fn ymd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("static regex"))
}

/// Parses the date printed on a receipt or invoice.
///
/// Accepts `2025-05-20`, `2025/5/20`, `2025.05.20` and `2025年05月20日`,
/// optionally surrounded by other text (e.g. a trailing time).
pub fn parse_document_date(raw: &str) -> Result<NaiveDate> {
    let normalized: String = raw
        .chars()
        .filter(|&c| c != '日')
        .map(|c| match c {
            '年' | '月' | '/' | '.' => '-',
            other => other,
        })
        .collect();

    let caps = ymd_pattern().captures(&normalized).ok_or_else(|| {
        AnalyticsError::DateError(format!(
            "No YYYY-MM-DD date found in '{}'",
            raw
        ))
    })?;

    let year: i32 = caps[1]
        .parse()
        .map_err(|_| AnalyticsError::DateError(format!("Invalid year in '{}'", raw)))?;
    let month: u32 = caps[2]
        .parse()
        .map_err(|_| AnalyticsError::DateError(format!("Invalid month in '{}'", raw)))?;
    let day: u32 = caps[3]
        .parse()
        .map_err(|_| AnalyticsError::DateError(format!("Invalid day in '{}'", raw)))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AnalyticsError::DateError(format!(
            "'{}' is not a calendar date ({}-{}-{})",
            raw, year, month, day
        ))
    })
}

/// Extracts a number from OCR amount text such as "￥1,234.50" or "88元".
///
/// Everything but digits and the decimal point is dropped first; returns
/// `None` when what remains does not parse.
pub fn parse_amount_text(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}
