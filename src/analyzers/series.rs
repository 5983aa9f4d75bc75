//! Chart series built from a filtered subset: the AQI trend and pollutant means.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::analyzers::types::{
    AqiPoint, ChartSeries, PollutantAverage, PollutantChart, Selection, TrendChart,
};
use crate::analyzers::utility::mean;
use crate::config::ChartConfig;
use crate::record::{Measurement, Pollutant};

pub const TREND_LABEL: &str = "AQI Index";
pub const POLLUTANT_LABEL: &str = "Pollutant Levels";

/// Format of the trend's x-axis labels, e.g. `01/01 10:00`.
pub const POINT_LABEL_FORMAT: &str = "%d/%m %H:%M";
/// Label used for records whose timestamp could not be parsed.
pub const INVALID_TIMESTAMP_LABEL: &str = "Invalid DateTime";

/// Shapes a filtered subset into the two chart series.
///
/// The trend keeps the subset's order (source file order, not re-sorted).
/// Pollutant averages are recomputed from scratch on every call.
pub fn build_series(
    subset: &[&Measurement],
    selection: &Selection,
    charts: &ChartConfig,
    generated_at: DateTime<Utc>,
) -> ChartSeries {
    let points = subset
        .iter()
        .map(|r| AqiPoint {
            label: point_label(r.timestamp),
            value: r.aqi,
        })
        .collect();

    ChartSeries {
        city: selection.city.clone(),
        range: selection.range,
        generated_at,
        matched: subset.len(),
        trend: TrendChart {
            chart: charts.trend,
            label: TREND_LABEL,
            points,
        },
        pollutants: PollutantChart {
            chart: charts.pollutants,
            label: POLLUTANT_LABEL,
            averages: pollutant_averages(subset),
        },
    }
}

/// Mean of each pollutant bucket, in [`Pollutant::ALL`] order.
///
/// Each bucket divides by the number of records that carry a reading for it,
/// which equals the subset size when every cell parsed. A bucket with no
/// readings (including an empty subset) reports `None` rather than NaN.
pub fn pollutant_averages(subset: &[&Measurement]) -> Vec<PollutantAverage> {
    Pollutant::ALL
        .iter()
        .map(|&pollutant| {
            let values: Vec<f64> = subset
                .iter()
                .filter_map(|r| r.pollutants.get(pollutant))
                .collect();

            PollutantAverage {
                pollutant,
                label: pollutant.label(),
                value: mean(&values),
                samples: values.len(),
            }
        })
        .collect()
}

fn point_label(timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(ts) => ts.format(POINT_LABEL_FORMAT).to_string(),
        None => INVALID_TIMESTAMP_LABEL.to_string(),
    }
}
