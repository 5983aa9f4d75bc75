//! Data types handed to the rendering collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::window::TimeRange;
use crate::record::Pollutant;

/// Chart kind requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
}

/// Current selector values: which city and which trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub city: String,
    pub range: TimeRange,
}

impl Selection {
    pub fn new(city: impl Into<String>, range: TimeRange) -> Self {
        Self {
            city: city.into(),
            range,
        }
    }
}

/// One point of the AQI trend: formatted timestamp and AQI value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiPoint {
    pub label: String,
    pub value: f64,
}

/// Mean concentration for one pollutant bucket.
///
/// `value` is `None` when no record in the subset carried a reading for the
/// bucket; `samples` is the divisor used for the mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantAverage {
    pub pollutant: Pollutant,
    pub label: &'static str,
    pub value: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub chart: ChartType,
    pub label: &'static str,
    pub points: Vec<AqiPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantChart {
    pub chart: ChartType,
    pub label: &'static str,
    pub averages: Vec<PollutantAverage>,
}

/// Complete chart-ready output for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub city: String,
    pub range: TimeRange,
    pub generated_at: DateTime<Utc>,
    /// Number of records in the filtered subset.
    pub matched: usize,
    pub trend: TrendChart,
    pub pollutants: PollutantChart,
}

impl ChartSeries {
    /// True when the selection matched no records.
    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }
}
