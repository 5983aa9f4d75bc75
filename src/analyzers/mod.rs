//! Filtering and aggregation of measurement snapshots.
//!
//! This module selects the records for a city and trailing time window,
//! then shapes them into the AQI trend and the six pollutant averages
//! consumed by the rendering collaborator.

pub mod filter;
pub mod series;
pub mod types;
pub mod utility;
pub mod window;
