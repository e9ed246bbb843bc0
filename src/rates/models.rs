// Rate series models and the reader for raw rate rows.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DatasetError, Result};

/// One row of the raw, irregularly sampled rate table.
///
/// Column names follow the spreadsheet export (`Date`, `Rate`); lowercase
/// names are accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRateRow {
    #[serde(alias = "date", rename = "Date")]
    pub date: Option<String>,
    #[serde(alias = "rate", rename = "Rate")]
    pub rate: Option<f64>,
}

impl RawRateRow {
    pub fn new(date: impl Into<String>, rate: f64) -> Self {
        Self {
            date: Some(date.into()),
            rate: Some(rate),
        }
    }
}

/// A native observation after parsing, sorting, and deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub rate: f64,
    /// Difference from the previous native observation; None for the first.
    pub rate_change: Option<f64>,
}

/// A rate value on a speech date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedRate {
    pub date: NaiveDate,
    pub rate: f64,
    pub rate_change: Option<f64>,
    /// Date of the native observation the value was carried from.
    pub observed_on: NaiveDate,
}

impl AlignedRate {
    /// True when the value was carried forward rather than observed that day.
    pub fn is_filled(&self) -> bool {
        self.observed_on != self.date
    }
}

/// Rates on exactly the corpus dates, ascending, one row per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateSeries {
    points: Vec<AlignedRate>,
}

impl RateSeries {
    pub(crate) fn from_points(points: Vec<AlignedRate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[AlignedRate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Point for an exact date (binary search; dates are sorted).
    pub fn get(&self, date: NaiveDate) -> Option<&AlignedRate> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }
}

/// Read the raw rate rows from a JSON array file.
pub fn read_rate_file(path: &Path) -> Result<Vec<RawRateRow>> {
    let contents = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    let rows: Vec<RawRateRow> =
        serde_json::from_str(&contents).map_err(|e| DatasetError::json(path, e))?;
    info!(path = %path.display(), rows = rows.len(), "rate rows loaded");
    Ok(rows)
}
