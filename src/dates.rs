// Date parsing — the single normalization boundary for raw date text.
//
// Speeches, scoring joins, and rate files all carry dates as free text in a
// handful of formats. Everything downstream works with `NaiveDate`; nothing
// else in the crate parses a date string.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DatasetError, Result};

/// Speeches dated before this are dropped from the corpus.
pub const DEFAULT_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2018, 6, 1) {
    Some(d) => d,
    None => panic!("invalid cutoff date"),
};

/// How a single accepted format is matched.
#[derive(Debug, Clone, Copy)]
enum DateFormat {
    /// A date-only format.
    Date(&'static str),
    /// A date-time format; only the date component is kept.
    DateTime(&'static str),
}

/// Accepted formats, in priority order. The first one that matches wins.
const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%Y-%m-%d"),           // 2023-08-25
    DateFormat::Date("%Y/%m/%d"),           // 2023/08/25
    DateFormat::DateTime("%Y-%m-%dT%H:%M:%S"), // 2023-08-25T00:00:00
    DateFormat::Date("%B %d, %Y"),          // August 25, 2023
    DateFormat::Date("%b %d, %Y"),          // Aug 25, 2023
];

impl DateFormat {
    fn parse(self, s: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(s, fmt).ok(),
            DateFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.date()),
        }
    }
}

/// Parse a raw date string into a calendar date.
///
/// Surrounding whitespace is ignored. Each format must consume the whole
/// string, so partial matches like `2023-08-25 extra` are rejected.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| fmt.parse(trimmed))
        .ok_or_else(|| DatasetError::UnrecognizedDateFormat {
            raw: raw.to_string(),
        })
}

/// Parse a date cell from a rate export.
///
/// Spreadsheet exports render dates as `2023-08-25 00:00:00`; only the text
/// before the first space is a date.
pub fn parse_rate_date(raw: &str) -> Result<NaiveDate> {
    // Trimmed first: a leading space would otherwise leave an empty head.
    let head = raw.trim().split(' ').next().unwrap_or_default();
    parse_date(head).map_err(|_| DatasetError::UnrecognizedDateFormat {
        raw: raw.to_string(),
    })
}
