//! Pipeline configuration.
//!
//! Stored as a JSON object on disk; every field is optional and falls back to
//! the defaults below:
//! ```json
//! {
//!   "data_url": "https://example.org/aqi_data.csv",
//!   "cities": ["Delhi", "Mumbai"],
//!   "layout": "aqi_only",
//!   "charts": { "trend": "line", "pollutants": "bar" },
//!   "refresh_interval_secs": 300,
//!   "invalid_timestamps": "exclude",
//!   "clock": "local"
//! }
//! ```

use chrono::{Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::analyzers::types::ChartType;
use crate::analyzers::window::InvalidTimestampPolicy;
use crate::error::ConfigError;
use crate::parser::{ColumnLayout, DEFAULT_TIMESTAMP_FORMAT, ParseOptions};

pub const DEFAULT_DATA_URL: &str =
    "https://cdn.jsdelivr.net/gh/Hari20032005/aqi-collector/data/aqi_data.csv";
pub const DEFAULT_CITIES: [&str; 5] = ["Delhi", "Mumbai", "Chennai", "Kolkata", "Bengaluru"];
pub const DEFAULT_REFRESH_SECS: u64 = 300;

/// Environment variable overriding [`PipelineConfig::data_url`].
pub const DATA_URL_ENV: &str = "AQI_DATA_URL";

/// Chart kinds requested for the two series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub trend: ChartType,
    pub pollutants: ChartType,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            trend: ChartType::Line,
            pollutants: ChartType::Bar,
        }
    }
}

/// Time zone the CSV timestamps are written in; "now" is read in the same zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockZone {
    #[default]
    Local,
    Utc,
}

impl ClockZone {
    pub fn now(self) -> NaiveDateTime {
        match self {
            ClockZone::Local => Local::now().naive_local(),
            ClockZone::Utc => Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_url: String,
    pub cities: Vec<String>,
    pub layout: ColumnLayout,
    pub charts: ChartConfig,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub timestamp_format: String,
    pub invalid_timestamps: InvalidTimestampPolicy,
    pub clock: ClockZone,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            layout: ColumnLayout::Full,
            charts: ChartConfig::default(),
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            request_timeout_secs: 30,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            invalid_timestamps: InvalidTimestampPolicy::Exclude,
            clock: ClockZone::Local,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_string(),
            source,
        })?;
        debug!(path, "Loaded pipeline config");
        Ok(config)
    }

    /// Loads from `path` when given, otherwise starts from defaults, then
    /// applies environment overrides and validates.
    pub fn resolve(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(DATA_URL_ENV) {
            config.data_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_url.trim().is_empty() {
            return Err(ConfigError::Invalid("data_url must not be empty".into()));
        }
        if self.cities.is_empty() {
            return Err(ConfigError::Invalid("at least one city is required".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            layout: self.layout,
            timestamp_format: self.timestamp_format.clone(),
        }
    }

    /// First configured city, used when no city is selected explicitly.
    pub fn default_city(&self) -> &str {
        self.cities.first().map(String::as_str).unwrap_or_default()
    }

    pub fn knows_city(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }
}
