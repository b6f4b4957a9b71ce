use crate::data::{
    CycleEdit, CycleListing, CycleRecord, NewEvent, NewPeriod, Persistable, TrackerEntry, TrackerStore,
};
use crate::error::ServiceError;
use crate::service::{DataService, EntrySummary};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// File-backed data service: one `tracker.json` in the data directory.
///
/// The store is held in memory behind an async mutex and written back after
/// every successful mutation, so calls are applied one at a time.
pub struct LocalService {
    dir: PathBuf,
    store: Mutex<TrackerStore>,
}

impl LocalService {
    pub fn open(dir: &Path) -> Result<Self> {
        let store = TrackerStore::load_from(dir)?;
        info!(dir = %dir.display(), entries = store.entries.len(), "opened local tracker store");
        Ok(LocalService {
            dir: dir.to_path_buf(),
            store: Mutex::new(store),
        })
    }

    /// Registers a new tracker entry. Fails if the id is taken.
    pub async fn create_entry(&self, entry_id: &str, title: &str) -> Result<(), ServiceError> {
        self.mutate(|store| {
            if store.entries.iter().any(|e| e.entry_id == entry_id) {
                return Err(ServiceError::Validation(format!("entry '{entry_id}' already exists")));
            }
            store.entries.push(TrackerEntry::new(entry_id, title));
            Ok(())
        })
        .await
    }

    /// Runs `f` against the store and persists the result when it succeeds.
    /// A failed write rolls the in-memory store back.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut TrackerStore) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut store = self.store.lock().await;
        let mut working = store.clone();
        let out = f(&mut working)?;
        working.save_to(&self.dir).map_err(|e| {
            warn!(error = %format!("{e:#}"), "failed to persist tracker store");
            ServiceError::storage(e)
        })?;
        *store = working;
        Ok(out)
    }
}

#[async_trait]
impl DataService for LocalService {
    async fn list_entries(&self) -> Result<Vec<EntrySummary>, ServiceError> {
        let store = self.store.lock().await;
        Ok(store
            .entries
            .iter()
            .map(|e| EntrySummary {
                entry_id: e.entry_id.clone(),
                title: e.title.clone(),
            })
            .collect())
    }

    async fn list_cycles(&self, entry_id: &str) -> Result<CycleListing, ServiceError> {
        let store = self.store.lock().await;
        Ok(store.entry(entry_id)?.listing())
    }

    async fn add_period(&self, entry_id: &str, period: NewPeriod) -> Result<CycleRecord, ServiceError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = self.mutate(|store| store.entry_mut(entry_id)?.add_period(&id, period)).await?;
        info!(entry = %entry_id, cycle = %record.id, start = %record.start, "added period");
        Ok(record)
    }

    async fn edit_cycle(&self, entry_id: &str, edit: CycleEdit) -> Result<(), ServiceError> {
        let cycle_id = edit.cycle_id.clone();
        self.mutate(|store| store.entry_mut(entry_id)?.edit_cycle(edit)).await?;
        info!(entry = %entry_id, cycle = %cycle_id, "edited cycle");
        Ok(())
    }

    async fn delete_cycle(&self, entry_id: &str, cycle_id: &str) -> Result<(), ServiceError> {
        self.mutate(|store| store.entry_mut(entry_id)?.delete_cycle(cycle_id)).await?;
        info!(entry = %entry_id, cycle = %cycle_id, "deleted cycle");
        Ok(())
    }

    async fn log_event(&self, entry_id: &str, event: NewEvent) -> Result<(), ServiceError> {
        let ts = Local::now().fixed_offset();
        self.mutate(|store| {
            store.entry_mut(entry_id)?.log_event(ts, event.protected, event.notes);
            Ok(())
        })
        .await?;
        info!(entry = %entry_id, protected = event.protected, "logged event");
        Ok(())
    }

    async fn export(&self, entry_id: &str) -> Result<TrackerEntry, ServiceError> {
        let store = self.store.lock().await;
        store.entry(entry_id).cloned()
    }
}
