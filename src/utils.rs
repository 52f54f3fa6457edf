//! Helpers for request parameters, text normalization and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Portal date parsing and page title derivation
//! - `limit` query parameter parsing
//! - Whitespace collapsing and character-based truncation for extracted text
//! - String truncation for logging
//! - File system validation for output directories

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Number of events returned when `limit` is absent, zero or not a number.
pub const DEFAULT_LIMIT: usize = 10;

/// Prefix shared by every daily portal page title.
pub const PORTAL_PREFIX: &str = "Portal:Current_events/";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse a requested portal date.
///
/// Accepts the ISO 8601 shapes a browser `Date` reads:
/// - calendar dates `YYYY-MM-DD`, plus the reduced `YYYY-MM` and `YYYY`
///   forms, which mean the first day of that month or year
/// - date-times without an offset (`YYYY-MM-DDTHH:MM[:SS[.fff]]`), read as UTC
/// - RFC 3339 timestamps, converted to UTC before taking the calendar date,
///   so `2024-03-05T23:30:00-05:00` is March 6th
///
/// # Errors
///
/// Returns the `chrono` parse error of the RFC 3339 attempt when no form
/// matches.
pub fn parse_portal_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }

    let rfc3339 =
        DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive());
    if rfc3339.is_ok() {
        return rfc3339;
    }

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let reduced = match raw.split_once('-') {
        Some((year, month))
            if year.len() == 4 && month.len() == 2 && all_digits(year) && all_digits(month) =>
        {
            NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
        }
        None if raw.len() == 4 && all_digits(raw) => {
            NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok()
        }
        _ => None,
    };
    match reduced {
        Some(date) => Ok(date),
        None => rfc3339,
    }
}

/// Portal page suffix for a date, e.g. `2024_March_5`.
///
/// The day is never zero padded.
pub fn portal_date(date: NaiveDate) -> String {
    format!(
        "{}_{}_{}",
        date.year(),
        MONTH_NAMES[date.month0() as usize],
        date.day()
    )
}

/// Full portal page title for a date, e.g. `Portal:Current_events/2024_March_5`.
pub fn portal_page_title(date: NaiveDate) -> String {
    format!("{}{}", PORTAL_PREFIX, portal_date(date))
}

/// Parse the `limit` query parameter.
///
/// Reads the leading run of ASCII digits (an optional `+` sign is allowed).
/// Absent, empty, non-numeric, negative or zero values all yield
/// [`DEFAULT_LIMIT`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_limit(Some("5")), 5);
/// assert_eq!(parse_limit(Some("7x")), 7);
/// assert_eq!(parse_limit(Some("abc")), 10);
/// ```
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_LIMIT;
    };
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return DEFAULT_LIMIT;
    }
    match digits.parse::<usize>() {
        Ok(0) => DEFAULT_LIMIT,
        Ok(n) => n,
        // A digit run that overflows is still numeric.
        Err(_) => usize::MAX,
    }
}

/// Replace every whitespace run with a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// First `max` characters of `s` (characters, not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to a
/// character boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
