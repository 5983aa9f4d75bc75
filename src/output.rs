//! Hand-off of chart series to the rendering collaborator, plus diagnostics output.
//!
//! Supports pretty-printing, JSON logging, a JSON file that is rewritten on
//! every update, and a CSV dump of rejected rows.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::ChartSeries;
use crate::parser::RejectedRow;

/// Consumer of prepared series. Each call replaces whatever the previous call
/// produced; nothing is merged across updates.
pub trait Render {
    fn render(&self, series: &ChartSeries) -> Result<()>;
}

impl<R: Render + ?Sized> Render for Box<R> {
    fn render(&self, series: &ChartSeries) -> Result<()> {
        (**self).render(series)
    }
}

/// Logs chart series using Rust's debug pretty-print format.
pub fn print_pretty(series: &ChartSeries) {
    debug!("{:#?}", series);
}

/// Logs chart series as pretty-printed JSON.
pub fn print_json(series: &ChartSeries) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(series)?);
    Ok(())
}

/// Renders to the log: a one-line summary followed by the JSON payload.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Render for LogRenderer {
    fn render(&self, series: &ChartSeries) -> Result<()> {
        info!(
            city = %series.city,
            range = %series.range,
            points = series.trend.points.len(),
            "Rendering charts"
        );
        print_pretty(series);
        print_json(series)
    }
}

/// Renders by rewriting a JSON file. The new content is written beside the
/// target and renamed over it, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileRenderer {
    path: PathBuf,
}

impl JsonFileRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Render for JsonFileRenderer {
    fn render(&self, series: &ChartSeries) -> Result<()> {
        let body = serde_json::to_vec_pretty(series)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        debug!(path = %self.path.display(), matched = series.matched, "Chart JSON written");
        Ok(())
    }
}

#[derive(Serialize)]
struct RejectionRecord<'a> {
    line: u64,
    reason: &'a str,
}

/// Writes rejected-row diagnostics to a CSV file, replacing any existing file.
pub fn write_rejections(path: &str, rejected: &[RejectedRow]) -> Result<()> {
    debug!(path, rows = rejected.len(), "Writing rejected rows");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rejected {
        let reason = row.reason.to_string();
        writer.serialize(RejectionRecord {
            line: row.line,
            reason: &reason,
        })?;
    }
    writer.flush()?;

    Ok(())
}
