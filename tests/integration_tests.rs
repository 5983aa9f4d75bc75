use aqi_monitor::analyzers::filter::filter_records;
use aqi_monitor::analyzers::series::build_series;
use aqi_monitor::analyzers::types::Selection;
use aqi_monitor::analyzers::window::{InvalidTimestampPolicy, TimeRange};
use aqi_monitor::config::ChartConfig;
use aqi_monitor::parser::{ParseOptions, RejectReason, parse_measurements};
use aqi_monitor::record::Measurement;
use chrono::{NaiveDate, NaiveDateTime, Utc};

const FIXTURE: &str = include_str!("fixtures/aqi_data.csv");

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn delhi(records: &[Measurement], range: TimeRange, policy: InvalidTimestampPolicy) -> Vec<&Measurement> {
    filter_records(records, "Delhi", range, noon(), policy)
}

#[test]
fn test_fixture_rows_are_classified() {
    let outcome = parse_measurements(FIXTURE, &ParseOptions::default());

    assert_eq!(outcome.records.len(), 8);
    assert_eq!(outcome.rejected.len(), 2);
    assert_eq!(outcome.rejected[0].line, 6);
    assert_eq!(outcome.rejected[1].line, 11);
    assert_eq!(
        outcome.rejected[1].reason,
        RejectReason::InvalidAqi("n/a".to_string())
    );
}

#[test]
fn test_full_pipeline_daily() {
    let outcome = parse_measurements(FIXTURE, &ParseOptions::default());
    let subset = delhi(&outcome.records, TimeRange::Daily, InvalidTimestampPolicy::Exclude);

    let series = build_series(
        &subset,
        &Selection::new("Delhi", TimeRange::Daily),
        &ChartConfig::default(),
        Utc::now(),
    );

    let labels: Vec<_> = series.trend.points.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, ["01/01 06:00", "01/01 09:00", "01/01 11:30"]);

    let co = &series.pollutants.averages[0];
    assert_eq!(co.label, "CO");
    assert_eq!(co.samples, 2);
    assert_eq!(co.value, Some(1100.5));

    let no2 = &series.pollutants.averages[1];
    assert_eq!(no2.samples, 3);
    assert_eq!(no2.value, Some((40.1 + 38.9 + 36.0) / 3.0));

    let o3 = &series.pollutants.averages[2];
    assert_eq!(o3.samples, 2);
    assert_eq!(o3.value, Some(14.0));
}

#[test]
fn test_ranges_widen_the_subset() {
    let outcome = parse_measurements(FIXTURE, &ParseOptions::default());
    let policy = InvalidTimestampPolicy::Exclude;

    assert_eq!(delhi(&outcome.records, TimeRange::Daily, policy).len(), 3);
    assert_eq!(delhi(&outcome.records, TimeRange::Weekly, policy).len(), 3);
    assert_eq!(delhi(&outcome.records, TimeRange::Monthly, policy).len(), 4);
}

#[test]
fn test_invalid_timestamp_policy_branches() {
    let outcome = parse_measurements(FIXTURE, &ParseOptions::default());

    let excluded = delhi(&outcome.records, TimeRange::Daily, InvalidTimestampPolicy::Exclude);
    assert!(excluded.iter().all(|r| r.timestamp.is_some()));

    let included = delhi(&outcome.records, TimeRange::Daily, InvalidTimestampPolicy::Include);
    assert_eq!(included.len(), excluded.len() + 1);
    assert_eq!(included.iter().filter(|r| r.timestamp.is_none()).count(), 1);
}

#[test]
fn test_unknown_city_yields_no_data() {
    let outcome = parse_measurements(FIXTURE, &ParseOptions::default());
    let subset = filter_records(
        &outcome.records,
        "Patna",
        TimeRange::Monthly,
        noon(),
        InvalidTimestampPolicy::Include,
    );

    let series = build_series(
        &subset,
        &Selection::new("Patna", TimeRange::Monthly),
        &ChartConfig::default(),
        Utc::now(),
    );
    assert!(series.is_empty());
    assert!(series.pollutants.averages.iter().all(|a| a.value.is_none()));
}
