pub mod analyzers;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod record;
pub mod snapshot;
