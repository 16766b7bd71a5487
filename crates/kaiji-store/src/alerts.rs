//! The cumulative alert store: one JSON array rewritten in full on every save.
//!
//! The store doubles as the triage resumption index. A date counts as triaged
//! as soon as any entry (alert or tombstone) carries it as its disclosure date.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use kaiji_core::{AlertRecord, ListingDate};
use tracing::{debug, info};

use crate::StoreError;
use crate::atomic::write_atomic;

/// Storage for the ordered sequence of alert records.
pub trait AlertRepo: Send + Sync {
    /// Load every entry in store order. A store that does not exist yet is empty.
    fn load(&self) -> Result<Vec<AlertRecord>, StoreError>;

    /// Replace the whole store.
    fn save(&self, alerts: &[AlertRecord]) -> Result<(), StoreError>;
}

/// Pretty-printed JSON array on disk.
pub struct FsAlertRepo {
    path: PathBuf,
}

impl FsAlertRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertRepo for FsAlertRepo {
    fn load(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let alerts: Vec<AlertRecord> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        debug!(count = alerts.len(), path = %self.path.display(), "loaded alert store");
        Ok(alerts)
    }

    fn save(&self, alerts: &[AlertRecord]) -> Result<(), StoreError> {
        let mut json = serde_json::to_vec_pretty(alerts)?;
        json.push(b'\n');
        write_atomic(&self.path, &json)?;
        info!(count = alerts.len(), path = %self.path.display(), "saved alert store");
        Ok(())
    }
}

/// Distinct disclosure dates present in the store, tombstones included.
pub fn triaged_dates(alerts: &[AlertRecord]) -> BTreeSet<ListingDate> {
    alerts.iter().filter_map(|a| a.disclosure_date()).collect()
}

/// Store indices of entries awaiting a summary, in store order.
pub fn pending_summaries(alerts: &[AlertRecord]) -> Vec<usize> {
    alerts
        .iter()
        .enumerate()
        .filter(|(_, a)| a.awaits_summary())
        .map(|(i, _)| i)
        .collect()
}
