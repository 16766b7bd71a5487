//! In-memory repositories for exercising pipeline logic without a filesystem.

use std::collections::BTreeMap;
use std::sync::Mutex;

use kaiji_core::{AlertRecord, DisclosureRecord, ListingDate};

use crate::{AlertRepo, DocumentRepo, ListingRepo, StoreError};

fn poisoned() -> StoreError {
    StoreError::Other("in-memory store lock poisoned".into())
}

#[derive(Default)]
pub struct MemoryListingRepo {
    listings: Mutex<BTreeMap<ListingDate, Vec<DisclosureRecord>>>,
}

impl MemoryListingRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a listing, as if it had been harvested earlier.
    pub fn with(self, date: ListingDate, records: Vec<DisclosureRecord>) -> Self {
        if let Ok(mut map) = self.listings.lock() {
            map.insert(date, records);
        }
        self
    }
}

impl ListingRepo for MemoryListingRepo {
    fn exists(&self, date: ListingDate) -> bool {
        self.listings
            .lock()
            .map(|m| m.contains_key(&date))
            .unwrap_or(false)
    }

    fn load(&self, date: ListingDate) -> Result<Vec<DisclosureRecord>, StoreError> {
        let map = self.listings.lock().map_err(|_| poisoned())?;
        map.get(&date)
            .cloned()
            .ok_or_else(|| StoreError::ListingNotFound(format!("memory:{date}").into()))
    }

    fn save(&self, date: ListingDate, records: &[DisclosureRecord]) -> Result<(), StoreError> {
        let mut map = self.listings.lock().map_err(|_| poisoned())?;
        map.insert(date, records.to_vec());
        Ok(())
    }

    fn dates(&self) -> Result<Vec<ListingDate>, StoreError> {
        let map = self.listings.lock().map_err(|_| poisoned())?;
        Ok(map.keys().copied().collect())
    }
}

#[derive(Default)]
pub struct MemoryAlertRepo {
    alerts: Mutex<Option<Vec<AlertRecord>>>,
    saves: Mutex<usize>,
}

impl MemoryAlertRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(alerts: Vec<AlertRecord>) -> Self {
        Self {
            alerts: Mutex::new(Some(alerts)),
            saves: Mutex::new(0),
        }
    }

    /// Number of times [`AlertRepo::save`] has been called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }

    /// Current contents (empty if never saved).
    pub fn snapshot(&self) -> Vec<AlertRecord> {
        self.alerts
            .lock()
            .ok()
            .and_then(|a| a.clone())
            .unwrap_or_default()
    }
}

impl AlertRepo for MemoryAlertRepo {
    fn load(&self) -> Result<Vec<AlertRecord>, StoreError> {
        let alerts = self.alerts.lock().map_err(|_| poisoned())?;
        Ok(alerts.clone().unwrap_or_default())
    }

    fn save(&self, alerts: &[AlertRecord]) -> Result<(), StoreError> {
        *self.alerts.lock().map_err(|_| poisoned())? = Some(alerts.to_vec());
        *self.saves.lock().map_err(|_| poisoned())? += 1;
        Ok(())
    }
}

/// Documents keyed by stored path `mem/<name>`.
#[derive(Default)]
pub struct MemoryDocumentRepo {
    docs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryDocumentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.docs
            .lock()
            .map(|d| {
                d.keys()
                    .filter_map(|k| k.strip_prefix("mem/").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn remove(&self, name: &str) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.remove(&format!("mem/{name}"));
        }
    }
}

impl DocumentRepo for MemoryDocumentRepo {
    fn exists(&self, name: &str) -> bool {
        self.docs
            .lock()
            .map(|d| d.contains_key(&self.stored_path(name)))
            .unwrap_or(false)
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let key = self.stored_path(name);
        self.docs
            .lock()
            .map_err(|_| poisoned())?
            .insert(key, bytes.to_vec());
        Ok(())
    }

    fn stored_path(&self, name: &str) -> String {
        format!("mem/{name}")
    }

    fn read(&self, stored_path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let docs = self.docs.lock().map_err(|_| poisoned())?;
        Ok(docs.get(stored_path).cloned())
    }
}
