//! Typed measurement records produced by the CSV parser.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// One of the six tracked pollutant buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Co,
    No2,
    O3,
    So2,
    #[serde(rename = "pm2_5")]
    Pm25,
    Pm10,
}

impl Pollutant {
    /// Buckets in chart order.
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Co,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Pm25,
        Pollutant::Pm10,
    ];

    /// Category label shown on the pollutant chart.
    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Co => "CO",
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::So2 => "SO2",
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutant concentrations for a single row. `None` means the cell was
/// missing or not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PollutantReadings {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

impl PollutantReadings {
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Co => self.co,
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
            Pollutant::So2 => self.so2,
            Pollutant::Pm25 => self.pm2_5,
            Pollutant::Pm10 => self.pm10,
        }
    }

    /// Builds readings from values in [`Pollutant::ALL`] order.
    pub fn from_ordered(values: [Option<f64>; 6]) -> Self {
        let [co, no2, o3, so2, pm2_5, pm10] = values;
        Self {
            co,
            no2,
            o3,
            so2,
            pm2_5,
            pm10,
        }
    }
}

/// A single valid CSV data row.
///
/// `aqi` is always finite; rows failing that check never become a
/// `Measurement`. `timestamp` is `None` when the text did not match the
/// configured format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub city: String,
    pub timestamp: Option<NaiveDateTime>,
    pub aqi: f64,
    pub pollutants: PollutantReadings,
}
