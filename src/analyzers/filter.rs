//! Selection of the records that fall in a city and trailing time window.

use chrono::NaiveDateTime;

use crate::analyzers::window::{InvalidTimestampPolicy, TimeRange};
use crate::record::Measurement;

/// Selects records for `city` whose timestamp is at or after the window cutoff.
///
/// The city match is exact and case-sensitive. There is no upper bound, so
/// records dated after `now` are kept. Source order is preserved.
pub fn filter_records<'a>(
    records: &'a [Measurement],
    city: &str,
    range: TimeRange,
    now: NaiveDateTime,
    policy: InvalidTimestampPolicy,
) -> Vec<&'a Measurement> {
    let cutoff = range.cutoff(now);

    records
        .iter()
        .filter(|r| r.city == city)
        .filter(|r| match r.timestamp {
            Some(ts) => ts >= cutoff,
            None => policy == InvalidTimestampPolicy::Include,
        })
        .collect()
}
