// Rate alignment — resample an irregular rate series onto speech dates.
//
// Steps, in order:
//   1. parse dates, stable-sort ascending, keep the first row per date
//   2. rate_change = first difference against the previous native row
//   3. collect the distinct corpus dates
//   4-5. carry the latest native observation on or before each corpus date
//   6. emit one row per corpus date, ascending
//
// rate_change is never recomputed against the speech-date grid; a filled row
// keeps the change computed at its source observation.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::models::{AlignedRate, RateObservation, RateSeries, RawRateRow};
use crate::corpus::SpeechCorpus;
use crate::dates::parse_rate_date;
use crate::error::{DatasetError, Result};

/// Parse, sort, and deduplicate raw rows, then compute first differences.
pub fn native_observations(raw: &[RawRateRow]) -> Result<Vec<RateObservation>> {
    let mut parsed = Vec::with_capacity(raw.len());
    for (position, row) in raw.iter().enumerate() {
        let record = || row.date.clone().unwrap_or_else(|| format!("#{position}"));
        let date_text = row
            .date
            .as_deref()
            .ok_or_else(|| DatasetError::schema("rates", record(), "Date"))?;
        let date = parse_rate_date(date_text)?;
        let rate = row
            .rate
            .ok_or_else(|| DatasetError::schema("rates", record(), "Rate"))?;
        parsed.push((date, rate));
    }

    // Stable sort keeps input order among equal dates, so dedup keeps the
    // first occurrence.
    parsed.sort_by_key(|&(date, _)| date);
    let before = parsed.len();
    parsed.dedup_by_key(|&mut (date, _)| date);
    if parsed.len() < before {
        debug!(
            duplicates = before - parsed.len(),
            "duplicate rate dates dropped"
        );
    }

    let mut observations = Vec::with_capacity(parsed.len());
    let mut previous: Option<f64> = None;
    for (date, rate) in parsed {
        observations.push(RateObservation {
            date,
            rate,
            rate_change: previous.map(|p| rate - p),
        });
        previous = Some(rate);
    }
    Ok(observations)
}

/// Forward-fill native observations onto `dates` (ascending, distinct).
///
/// Fails on the first date that precedes every observation.
pub fn forward_fill(observations: &[RateObservation], dates: &[NaiveDate]) -> Result<RateSeries> {
    let first_observation = observations.first().map(|o| o.date);
    let mut points = Vec::with_capacity(dates.len());
    let mut cursor = 0usize;
    let mut current: Option<&RateObservation> = None;

    for &date in dates {
        while cursor < observations.len() && observations[cursor].date <= date {
            current = Some(&observations[cursor]);
            cursor += 1;
        }

        let source = current.ok_or(DatasetError::MissingRateCoverage {
            date,
            first_observation,
        })?;

        points.push(AlignedRate {
            date,
            rate: source.rate,
            rate_change: source.rate_change,
            observed_on: source.date,
        });
    }

    Ok(RateSeries::from_points(points))
}

/// Align the raw rate series to the corpus's speech dates.
pub fn align_rates(raw: &[RawRateRow], corpus: &SpeechCorpus) -> Result<RateSeries> {
    let observations = native_observations(raw)?;
    let dates = corpus.dates();
    let series = forward_fill(&observations, &dates)?;

    let filled = series.points().iter().filter(|p| p.is_filled()).count();
    info!(
        observations = observations.len(),
        speech_dates = series.len(),
        filled,
        "rates aligned to speech dates"
    );
    Ok(series)
}
