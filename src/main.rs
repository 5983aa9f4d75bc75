//! CLI entry point for the AQI monitor.
//!
//! Provides subcommands for rendering a city's charts once, watching a source
//! with periodic refresh, validating a CSV source, and listing cities.

use anyhow::Result;
use aqi_monitor::analyzers::types::Selection;
use aqi_monitor::analyzers::window::TimeRange;
use aqi_monitor::config::PipelineConfig;
use aqi_monitor::dashboard::{Dashboard, SelectorCommand};
use aqi_monitor::fetch::BasicClient;
use aqi_monitor::output::{JsonFileRenderer, LogRenderer, Render, write_rejections};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqi_monitor")]
#[command(about = "Fetch air-quality CSV data and prepare chart series", long_about = None)]
struct Cli {
    /// JSON pipeline config (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch once and render the charts for a city and window
    Show {
        /// City to display (defaults to the first configured city)
        #[arg(long)]
        city: Option<String>,

        /// Time window: daily, weekly or monthly
        #[arg(short, long, default_value = "daily")]
        range: TimeRange,

        /// File path or URL to read instead of the configured URL
        #[arg(short, long)]
        source: Option<String>,

        /// Write the chart JSON to this file instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Refresh periodically; type `city <name>` or `range <tag>` on stdin to reselect
    Watch {
        #[arg(long)]
        city: Option<String>,

        #[arg(short, long, default_value = "daily")]
        range: TimeRange,

        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long)]
        output: Option<String>,

        /// Refresh interval in seconds (overrides the config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Parse a source and report rows that would be skipped
    Validate {
        #[arg(short, long)]
        source: Option<String>,

        /// Write rejected rows to this CSV file
        #[arg(long)]
        rejections: Option<String>,
    },
    /// List the configured cities
    Cities,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqi_monitor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqi_monitor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Show {
            city,
            range,
            source,
            output,
        } => {
            let dashboard = build_dashboard(config, source)?;
            let selection = select(&dashboard, city, range);

            dashboard.refresh().await?;
            if let Some(series) = dashboard.recompute(&selection) {
                renderer_for(output).render(&series)?;
            }
        }
        Commands::Watch {
            city,
            range,
            source,
            output,
            interval,
        } => {
            if let Some(secs) = interval {
                config.refresh_interval_secs = secs;
                config.validate()?;
            }
            let dashboard = build_dashboard(config, source)?;
            let selection = select(&dashboard, city, range);
            watch_source(&dashboard, renderer_for(output), selection).await;
        }
        Commands::Validate { source, rejections } => {
            let dashboard = build_dashboard(config, source)?;
            let report = dashboard.refresh().await?;

            info!(
                source = dashboard.source(),
                records = report.records,
                rejected = report.rejected,
                "Validation complete"
            );

            if let Some(snapshot) = dashboard.store().read() {
                for row in snapshot.rejected.iter() {
                    warn!(line = row.line, reason = %row.reason, "Rejected row");
                }
                if let Some(path) = rejections {
                    write_rejections(&path, &snapshot.rejected)?;
                    info!(path = %path, "Rejected rows written");
                }
            }
        }
        Commands::Cities => {
            for city in &config.cities {
                info!(city = %city, "City");
            }
            info!(total = config.cities.len(), "Configured cities");
        }
    }

    Ok(())
}

fn build_dashboard(config: PipelineConfig, source: Option<String>) -> Result<Dashboard<BasicClient>> {
    let client = BasicClient::with_timeout(config.request_timeout())?;
    let dashboard = Dashboard::new(config, client);
    Ok(match source {
        Some(source) => dashboard.with_source(source),
        None => dashboard,
    })
}

fn select(dashboard: &Dashboard<BasicClient>, city: Option<String>, range: TimeRange) -> Selection {
    let mut selection = dashboard.initial_selection();
    selection.range = range;
    if let Some(city) = city {
        selection.city = city;
    }
    selection
}

fn renderer_for(output: Option<String>) -> Box<dyn Render + Send + Sync> {
    match output {
        Some(path) => Box::new(JsonFileRenderer::new(path)),
        None => Box::new(LogRenderer),
    }
}

/// Runs the refresh loop with stdin selector commands until Ctrl+C.
async fn watch_source(
    dashboard: &Dashboard<BasicClient>,
    renderer: Box<dyn Render + Send + Sync>,
    selection: Selection,
) {
    let (selection_tx, selection_rx) = watch::channel(selection);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, stopping");
        }
        let _ = shutdown_tx.send(true);
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match SelectorCommand::parse(&line) {
                Ok(command) => {
                    selection_tx.send_modify(|selection| command.apply(selection));
                }
                Err(e) => warn!(error = %e, "Ignoring selector input"),
            }
        }
    });

    info!("Watching for updates. Press Ctrl+C to stop.");
    dashboard.run(&renderer, selection_rx, shutdown_rx).await;

    if dashboard.store().read().is_none() {
        error!("No data was loaded before shutdown");
    }
}
