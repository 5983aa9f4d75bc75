//! Trailing time windows used to select records for display.

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SelectionError;

/// Requested display window, measured backwards from "now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::Daily, TimeRange::Weekly, TimeRange::Monthly];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Daily => "daily",
            TimeRange::Weekly => "weekly",
            TimeRange::Monthly => "monthly",
        }
    }

    /// Earliest timestamp still inside the window.
    ///
    /// Monthly steps back one calendar month (clamped to the end of shorter
    /// months), so March 31 goes back to February 28 or 29.
    pub fn cutoff(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            TimeRange::Daily => now - Duration::days(1),
            TimeRange::Weekly => now - Duration::weeks(1),
            TimeRange::Monthly => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(NaiveDateTime::MIN),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(TimeRange::Daily),
            "weekly" => Ok(TimeRange::Weekly),
            "monthly" => Ok(TimeRange::Monthly),
            other => Err(SelectionError::UnknownRange(other.to_string())),
        }
    }
}

/// What to do with records whose timestamp could not be parsed.
///
/// Only the AQI column gates whether a row is parsed at all, so records
/// without a timestamp reach the filter and need an explicit rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidTimestampPolicy {
    /// Never inside any window.
    #[default]
    Exclude,
    /// Inside every window.
    Include,
}
