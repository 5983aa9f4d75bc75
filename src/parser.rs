//! CSV parser for air-quality measurement files.
//!
//! The first physical line is a header and is skipped without validation.
//! Blank lines are ignored. Fields are split on a literal comma (no quoting)
//! and mapped positionally
//! according to a [`ColumnLayout`]. A row is kept only when its AQI column
//! holds a finite number; everything else is reported as a [`RejectedRow`].

use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::record::{Measurement, PollutantReadings};

/// Default timestamp format written by the collector.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CITY_COL: usize = 0;
const TIMESTAMP_COL: usize = 1;
const AQI_COL: usize = 2;
const FIRST_POLLUTANT_COL: usize = 3;

/// Positional column set consumed from each row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// `city,timestamp,aqi,co,no2,o3,so2,pm2_5,pm10`
    #[default]
    Full,
    /// `city,timestamp,aqi`
    AqiOnly,
}

impl ColumnLayout {
    pub fn has_pollutants(self) -> bool {
        matches!(self, ColumnLayout::Full)
    }
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub layout: ColumnLayout,
    pub timestamp_format: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            layout: ColumnLayout::Full,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Why a data row was left out of the parsed collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    /// The row has fewer columns than the AQI position.
    MissingAqi,
    /// The AQI cell is not a finite number.
    InvalidAqi(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingAqi => write!(f, "missing AQI column"),
            RejectReason::InvalidAqi(raw) => write!(f, "AQI '{raw}' is not a number"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// 1-based line number in the source text.
    pub line: u64,
    pub reason: RejectReason,
}

/// Result of classifying every data row of a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<Measurement>,
    pub rejected: Vec<RejectedRow>,
}

/// Parses CSV text into valid measurements and rejected-row diagnostics.
///
/// Never fails as a whole: problems are confined to the rows they occur in.
pub fn parse_measurements(text: &str, options: &ParseOptions) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    // The first physical line is the header, even when it is blank.
    for (idx, raw) in text.lines().enumerate().skip(1) {
        if raw.trim().is_empty() {
            continue;
        }

        let line = idx as u64 + 1;
        let row: StringRecord = raw.split(',').collect();
        match classify_row(&row, options) {
            Ok(record) => outcome.records.push(record),
            Err(reason) => {
                debug!(line, %reason, "Rejected CSV row");
                outcome.rejected.push(RejectedRow { line, reason });
            }
        }
    }

    if !outcome.rejected.is_empty() {
        warn!(
            kept = outcome.records.len(),
            rejected = outcome.rejected.len(),
            "Skipped invalid CSV rows"
        );
    }

    outcome
}

fn classify_row(row: &StringRecord, options: &ParseOptions) -> Result<Measurement, RejectReason> {
    let raw_aqi = row.get(AQI_COL).ok_or(RejectReason::MissingAqi)?;
    let aqi = parse_number(raw_aqi)
        .ok_or_else(|| RejectReason::InvalidAqi(raw_aqi.to_string()))?;

    let city = row.get(CITY_COL).unwrap_or_default().to_string();
    let timestamp = row
        .get(TIMESTAMP_COL)
        .and_then(|raw| parse_timestamp(raw, &options.timestamp_format));

    let pollutants = if options.layout.has_pollutants() {
        let mut values = [None; 6];
        for (i, slot) in values.iter_mut().enumerate() {
            *slot = row.get(FIRST_POLLUTANT_COL + i).and_then(parse_number);
        }
        PollutantReadings::from_ordered(values)
    } else {
        PollutantReadings::default()
    };

    Ok(Measurement {
        city,
        timestamp,
        aqi,
        pollutants,
    })
}

/// Parses a numeric cell; `None` stands in for "not a number".
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), format).ok()
}
