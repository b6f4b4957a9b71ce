use crate::data::persistence::Persistable;
use crate::data::{CycleEdit, CycleListing, CycleRecord, NewPeriod, PointEvent, PredictionParams};
use crate::error::ServiceError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One tracked person: their cycles, events and prediction settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TrackerEntry {
    pub entry_id: String,
    pub title: String,
    #[serde(default)]
    pub params: PredictionParams,
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub sex_events: Vec<PointEvent>,
}

impl TrackerEntry {
    pub fn new(entry_id: &str, title: &str) -> Self {
        TrackerEntry {
            entry_id: entry_id.to_string(),
            title: title.to_string(),
            ..TrackerEntry::default()
        }
    }

    pub fn listing(&self) -> CycleListing {
        CycleListing {
            cycles: self.cycles.clone(),
            sex_events: self.sex_events.clone(),
            params: self.params.clone(),
        }
    }

    fn sort_cycles(&mut self) {
        self.cycles.sort_by_key(|c| c.start);
    }

    /// Appends a period under `id` and keeps cycles ordered by start.
    pub fn add_period(&mut self, id: &str, period: NewPeriod) -> Result<CycleRecord, ServiceError> {
        let record = CycleRecord {
            id: id.to_string(),
            start: period.start,
            end: period.end,
            notes: period.notes,
        };
        validate_range(&record)?;
        self.cycles.push(record.clone());
        self.sort_cycles();
        Ok(record)
    }

    /// Applies the fields present in `edit`. Nothing changes when the
    /// result would end before it starts.
    pub fn edit_cycle(&mut self, edit: CycleEdit) -> Result<(), ServiceError> {
        let cycle = self
            .cycles
            .iter_mut()
            .find(|c| c.id == edit.cycle_id)
            .ok_or_else(|| ServiceError::CycleNotFound(edit.cycle_id.clone()))?;
        let mut updated = cycle.clone();
        if let Some(start) = edit.start {
            updated.start = start;
        }
        if edit.end.is_some() {
            updated.end = edit.end;
        }
        if edit.notes.is_some() {
            updated.notes = edit.notes;
        }
        validate_range(&updated)?;
        *cycle = updated;
        self.sort_cycles();
        Ok(())
    }

    pub fn delete_cycle(&mut self, cycle_id: &str) -> Result<(), ServiceError> {
        let before = self.cycles.len();
        self.cycles.retain(|c| c.id != cycle_id);
        if self.cycles.len() == before {
            return Err(ServiceError::CycleNotFound(cycle_id.to_string()));
        }
        Ok(())
    }

    pub fn log_event(&mut self, ts: DateTime<FixedOffset>, protected: bool, notes: Option<String>) {
        self.sex_events.push(PointEvent { ts, protected, notes });
    }
}

fn validate_range(record: &CycleRecord) -> Result<(), ServiceError> {
    match record.end {
        Some(end) if end < record.start => Err(ServiceError::Validation(format!(
            "period end {} is before start {}",
            end.format("%Y-%m-%d"),
            record.start.format("%Y-%m-%d")
        ))),
        _ => Ok(()),
    }
}

/// Every entry known to the local data service.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TrackerStore {
    #[serde(default)]
    pub entries: Vec<TrackerEntry>,
}

impl Persistable for TrackerStore {
    fn filename() -> &'static str {
        "tracker.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl TrackerStore {
    pub fn entry(&self, entry_id: &str) -> Result<&TrackerEntry, ServiceError> {
        self.entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .ok_or_else(|| ServiceError::EntryNotFound(entry_id.to_string()))
    }

    pub fn entry_mut(&mut self, entry_id: &str) -> Result<&mut TrackerEntry, ServiceError> {
        self.entries
            .iter_mut()
            .find(|e| e.entry_id == entry_id)
            .ok_or_else(|| ServiceError::EntryNotFound(entry_id.to_string()))
    }
}
