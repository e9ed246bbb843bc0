// Dataset errors — every fatal condition the core can report.
//
// Library code returns `Result<T, DatasetError>` so callers can match on the
// kind. The CLI wraps these in anyhow with extra context.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    /// None of the accepted date formats matched.
    #[error("unrecognized date format: {raw:?}")]
    UnrecognizedDateFormat { raw: String },

    /// A corpus date is earlier than every available rate observation.
    #[error("no rate observation on or before {date} (first observation: {})", fmt_first(.first_observation))]
    MissingRateCoverage {
        date: NaiveDate,
        first_observation: Option<NaiveDate>,
    },

    /// A required field is absent (or has the wrong shape) in a raw record.
    #[error("{source_name}: record {record} is missing required field '{field}'")]
    SchemaViolation {
        source_name: String,
        record: String,
        field: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DatasetError {
    pub(crate) fn schema(
        source_name: impl Into<String>,
        record: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        DatasetError::SchemaViolation {
            source_name: source_name.into(),
            record: record.into(),
            field: field.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        DatasetError::Json {
            path: path.into(),
            source,
        }
    }
}

fn fmt_first(first: &Option<NaiveDate>) -> String {
    match first {
        Some(d) => d.to_string(),
        None => "none".to_string(),
    }
}
