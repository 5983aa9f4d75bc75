//! Application shell: owns the snapshot, the fetch cadence and the recompute path.
//!
//! Refetching and recomputing are separate. A refresh replaces the snapshot
//! and re-renders; a selector change recomputes from the snapshot already
//! held, without touching the network.

use chrono::{NaiveDateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::analyzers::filter::filter_records;
use crate::analyzers::series::build_series;
use crate::analyzers::types::{ChartSeries, Selection};
use crate::analyzers::window::TimeRange;
use crate::config::PipelineConfig;
use crate::error::{FetchError, SelectionError};
use crate::fetch::{HttpClient, load_source};
use crate::output::Render;
use crate::parser::parse_measurements;
use crate::snapshot::{Snapshot, SnapshotStore};

/// Counts from one successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub records: usize,
    pub rejected: usize,
}

/// A selector change typed on the console, e.g. `city Mumbai` or `range weekly`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorCommand {
    City(String),
    Range(TimeRange),
}

impl SelectorCommand {
    pub fn parse(line: &str) -> Result<Self, SelectionError> {
        let line = line.trim();
        let (verb, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = arg.trim();

        match verb.to_lowercase().as_str() {
            "city" if !arg.is_empty() => Ok(SelectorCommand::City(arg.to_string())),
            "range" => Ok(SelectorCommand::Range(arg.parse()?)),
            _ => Err(SelectionError::UnknownCommand(line.to_string())),
        }
    }

    pub fn apply(self, selection: &mut Selection) {
        match self {
            SelectorCommand::City(city) => selection.city = city,
            SelectorCommand::Range(range) => selection.range = range,
        }
    }
}

pub struct Dashboard<C> {
    config: PipelineConfig,
    client: C,
    source: String,
    store: SnapshotStore,
}

impl<C: HttpClient> Dashboard<C> {
    /// Creates a dashboard reading from `config.data_url`.
    pub fn new(config: PipelineConfig, client: C) -> Self {
        let source = config.data_url.clone();
        Self {
            config,
            client,
            source,
            store: SnapshotStore::new(),
        }
    }

    /// Reads from `source` (a URL or a local path) instead of the configured URL.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Selection for the first configured city over the daily window.
    pub fn initial_selection(&self) -> Selection {
        Selection::new(self.config.default_city(), TimeRange::Daily)
    }

    /// Fetches and parses the source, then replaces the snapshot.
    ///
    /// On failure the previous snapshot is left in place.
    #[tracing::instrument(skip(self), fields(source = %self.source))]
    pub async fn refresh(&self) -> Result<RefreshReport, FetchError> {
        let text = load_source(&self.client, &self.source).await?;
        let outcome = parse_measurements(&text, &self.config.parse_options());

        let report = RefreshReport {
            records: outcome.records.len(),
            rejected: outcome.rejected.len(),
        };
        self.store
            .replace(Snapshot::new(&self.source, Utc::now(), outcome));

        info!(
            records = report.records,
            rejected = report.rejected,
            "Snapshot replaced"
        );
        Ok(report)
    }

    /// Builds series for `selection` against the wall clock.
    pub fn recompute(&self, selection: &Selection) -> Option<ChartSeries> {
        self.recompute_at(selection, self.config.clock.now())
    }

    /// Builds series for `selection` with an explicit "now".
    ///
    /// Returns `None` before the first successful refresh.
    pub fn recompute_at(&self, selection: &Selection, now: NaiveDateTime) -> Option<ChartSeries> {
        let snapshot = self.store.read()?;

        if !self.config.knows_city(&selection.city) {
            warn!(city = %selection.city, "Selected city is not in the configured list");
        }

        let subset = filter_records(
            &snapshot.records,
            &selection.city,
            selection.range,
            now,
            self.config.invalid_timestamps,
        );
        let series = build_series(&subset, selection, &self.config.charts, Utc::now());

        if series.is_empty() {
            warn!(city = %selection.city, range = %selection.range, "No records match selection");
        } else {
            debug!(
                city = %selection.city,
                range = %selection.range,
                matched = series.matched,
                "Series recomputed"
            );
        }
        Some(series)
    }

    /// Runs the refresh loop until `shutdown` changes or its sender is dropped.
    ///
    /// Fetches on every interval tick (the first tick fires immediately) and
    /// re-renders from the held snapshot whenever `selections` changes. Fetch
    /// errors are logged and the loop carries on with the stale snapshot.
    /// A shutdown during a fetch abandons the fetch.
    pub async fn run<R: Render>(
        &self,
        renderer: &R,
        mut selections: watch::Receiver<Selection>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut selections_open = true;

        info!(
            interval_secs = self.config.refresh_interval_secs,
            source = %self.source,
            "Starting refresh loop"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        result = self.refresh() => match result {
                            Ok(_) => {
                                let selection = selections.borrow().clone();
                                self.render_selection(renderer, &selection);
                            }
                            Err(e) => error!(error = %e, "Refresh failed, keeping previous snapshot"),
                        },
                        _ = shutdown.changed() => {
                            info!("Shutdown requested during fetch");
                            break;
                        }
                    }
                }
                changed = selections.changed(), if selections_open => {
                    if changed.is_err() {
                        debug!("Selector channel closed");
                        selections_open = false;
                        continue;
                    }
                    let selection = selections.borrow_and_update().clone();
                    info!(city = %selection.city, range = %selection.range, "Selection changed");
                    self.render_selection(renderer, &selection);
                }
            }
        }

        info!("Refresh loop stopped");
    }

    fn render_selection<R: Render>(&self, renderer: &R, selection: &Selection) {
        match self.recompute(selection) {
            Some(series) => {
                if let Err(e) = renderer.render(&series) {
                    error!(error = %e, "Render failed");
                }
            }
            None => debug!("No snapshot yet, skipping render"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockZone;
    use crate::fetch::fake::ScriptedClient;
    use crate::parser::ColumnLayout;
    use chrono::{Duration, NaiveDate};
    use std::sync::Mutex;

    const SCENARIO_CSV: &str =
        "city,timestamp,aqi\nDelhi,2024-01-01 10:00:00,150\nMumbai,2024-01-01 10:00:00,80";

    fn aqi_only_config() -> PipelineConfig {
        PipelineConfig {
            data_url: "https://example.org/aqi.csv".to_string(),
            layout: ColumnLayout::AqiOnly,
            clock: ClockZone::Utc,
            refresh_interval_secs: 3600,
            ..Default::default()
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Mutex<Vec<ChartSeries>>,
    }

    impl RecordingRenderer {
        fn count(&self) -> usize {
            self.rendered.lock().unwrap().len()
        }

        fn last_city(&self) -> Option<String> {
            self.rendered.lock().unwrap().last().map(|s| s.city.clone())
        }

        async fn wait_for(&self, n: usize) {
            for _ in 0..500 {
                if self.count() >= n {
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            panic!("expected {n} renders, saw {}", self.count());
        }
    }

    impl Render for RecordingRenderer {
        fn render(&self, series: &ChartSeries) -> anyhow::Result<()> {
            self.rendered.lock().unwrap().push(series.clone());
            Ok(())
        }
    }

    #[test]
    fn test_parse_selector_commands() {
        assert_eq!(
            SelectorCommand::parse("city Navi Mumbai"),
            Ok(SelectorCommand::City("Navi Mumbai".to_string()))
        );
        assert_eq!(
            SelectorCommand::parse("  RANGE weekly "),
            Ok(SelectorCommand::Range(TimeRange::Weekly))
        );
        assert_eq!(
            SelectorCommand::parse("range hourly"),
            Err(SelectionError::UnknownRange("hourly".to_string()))
        );
        assert!(matches!(
            SelectorCommand::parse("city"),
            Err(SelectionError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_apply_selector_command() {
        let mut selection = Selection::new("Delhi", TimeRange::Daily);
        SelectorCommand::Range(TimeRange::Monthly).apply(&mut selection);
        SelectorCommand::City("Chennai".to_string()).apply(&mut selection);
        assert_eq!(selection, Selection::new("Chennai", TimeRange::Monthly));
    }

    #[tokio::test]
    async fn test_recompute_before_refresh_is_none() {
        let dashboard = Dashboard::new(aqi_only_config(), ScriptedClient::empty());
        assert!(dashboard.recompute(&dashboard.initial_selection()).is_none());
    }

    #[tokio::test]
    async fn test_delhi_daily_scenario() {
        let client = ScriptedClient::new([(200, SCENARIO_CSV)]);
        let dashboard = Dashboard::new(aqi_only_config(), client);

        let report = dashboard.refresh().await.unwrap();
        assert_eq!(report, RefreshReport { records: 2, rejected: 0 });

        let series = dashboard
            .recompute_at(&Selection::new("Delhi", TimeRange::Daily), noon())
            .unwrap();
        assert_eq!(series.matched, 1);
        assert_eq!(series.trend.points.len(), 1);
        assert_eq!(series.trend.points[0].label, "01/01 10:00");
        assert_eq!(series.trend.points[0].value, 150.0);
        assert!(series.pollutants.averages.iter().all(|a| a.value.is_none()));
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent_for_fixed_now() {
        let client = ScriptedClient::new([(200, SCENARIO_CSV)]);
        let dashboard = Dashboard::new(aqi_only_config(), client);
        dashboard.refresh().await.unwrap();

        let selection = Selection::new("Delhi", TimeRange::Weekly);
        let mut first = dashboard.recompute_at(&selection, noon()).unwrap();
        let second = dashboard.recompute_at(&selection, noon()).unwrap();
        first.generated_at = second.generated_at;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_snapshot() {
        let client = ScriptedClient::new([(200, SCENARIO_CSV), (500, "boom")]);
        let dashboard = Dashboard::new(aqi_only_config(), client);

        dashboard.refresh().await.unwrap();
        let before = dashboard.store().read().unwrap();

        let err = dashboard.refresh().await.unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));

        let after = dashboard.store().read().unwrap();
        assert!(std::sync::Arc::ptr_eq(&before, &after));
        assert_eq!(after.records.len(), 2);

        // The next successful fetch replaces the stale snapshot.
        dashboard
            .client
            .push(200, "city,timestamp,aqi\nPune,2024-01-01 10:00:00,40\n");
        dashboard.refresh().await.unwrap();

        let recovered = dashboard.store().read().unwrap();
        assert!(!std::sync::Arc::ptr_eq(&after, &recovered));
        assert_eq!(recovered.records.len(), 1);
        assert_eq!(recovered.records[0].city, "Pune");
    }

    #[tokio::test]
    async fn test_refresh_counts_rejected_rows() {
        let csv = "city,timestamp,aqi\nDelhi,2024-01-01 10:00:00,150\nDelhi,2024-01-01 11:00:00,n/a\n";
        let dashboard = Dashboard::new(aqi_only_config(), ScriptedClient::new([(200, csv)]));

        let report = dashboard.refresh().await.unwrap();
        assert_eq!(report, RefreshReport { records: 1, rejected: 1 });
        assert_eq!(dashboard.store().read().unwrap().rejected[0].line, 3);
    }

    #[tokio::test]
    async fn test_run_recomputes_on_selection_change_without_refetch() {
        let recent = (Utc::now().naive_utc() - Duration::hours(1))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let csv = format!("city,timestamp,aqi\nDelhi,{recent},150\nMumbai,{recent},80\n");

        let dashboard = Dashboard::new(aqi_only_config(), ScriptedClient::new([(200, csv)]));
        let renderer = RecordingRenderer::default();
        let (selection_tx, selection_rx) = watch::channel(dashboard.initial_selection());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = async {
            renderer.wait_for(1).await;
            assert_eq!(renderer.last_city().as_deref(), Some("Delhi"));

            selection_tx
                .send(Selection::new("Mumbai", TimeRange::Daily))
                .unwrap();
            renderer.wait_for(2).await;
            assert_eq!(renderer.last_city().as_deref(), Some("Mumbai"));

            shutdown_tx.send(true).unwrap();
        };

        tokio::join!(dashboard.run(&renderer, selection_rx, shutdown_rx), driver);

        assert_eq!(dashboard.client.calls(), 1);
        let rendered = renderer.rendered.lock().unwrap();
        assert_eq!(rendered[0].trend.points[0].value, 150.0);
        assert_eq!(rendered[1].trend.points[0].value, 80.0);
    }

    #[tokio::test]
    async fn test_run_survives_fetch_failure() {
        let client = ScriptedClient::new([(503, "unavailable")]);
        let dashboard = Dashboard::new(aqi_only_config(), client);
        let renderer = RecordingRenderer::default();
        let (_selection_tx, selection_rx) = watch::channel(dashboard.initial_selection());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = async {
            while dashboard.client.calls() == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            shutdown_tx.send(true).unwrap();
        };

        tokio::join!(dashboard.run(&renderer, selection_rx, shutdown_rx), driver);

        assert_eq!(renderer.count(), 0);
        assert!(dashboard.store().read().is_none());
    }
}
