//! The current dataset, replaced wholesale after each successful fetch.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::parser::{ParseOutcome, RejectedRow};
use crate::record::Measurement;

/// Parsed measurements as of one successful fetch. Never mutated.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<Measurement>,
    pub rejected: Vec<RejectedRow>,
}

impl Snapshot {
    pub fn new(source: impl Into<String>, fetched_at: DateTime<Utc>, outcome: ParseOutcome) -> Self {
        Self {
            source: source.into(),
            fetched_at,
            records: outcome.records,
            rejected: outcome.rejected,
        }
    }
}

/// Holds the latest [`Snapshot`]. Readers get a shared handle to a complete
/// snapshot; a replace swaps the handle and never touches the old data.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, or `None` before the first successful fetch.
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Installs `snapshot` and returns the one it superseded.
    pub fn replace(&self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let next = Some(Arc::new(snapshot));
        match self.current.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }
}
