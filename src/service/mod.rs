//! The data service the calendar talks to.
//!
//! Everything behind [`DataService`] is remote as far as the calendar is
//! concerned: every call may suspend and every call may fail with a
//! [`ServiceError`]. [`local::LocalService`] is the file-backed implementation
//! used by the binary.

pub mod local;

use crate::data::{CycleEdit, CycleListing, CycleRecord, Mutation, NewEvent, NewPeriod, TrackerEntry};
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use local::LocalService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub entry_id: String,
    pub title: String,
}

#[async_trait]
pub trait DataService: Send + Sync {
    async fn list_entries(&self) -> Result<Vec<EntrySummary>, ServiceError>;

    async fn list_cycles(&self, entry_id: &str) -> Result<CycleListing, ServiceError>;

    /// Creates a period; the service assigns its id.
    async fn add_period(&self, entry_id: &str, period: NewPeriod) -> Result<CycleRecord, ServiceError>;

    /// Partial update: fields left as `None` keep their stored value.
    async fn edit_cycle(&self, entry_id: &str, edit: CycleEdit) -> Result<(), ServiceError>;

    async fn delete_cycle(&self, entry_id: &str, cycle_id: &str) -> Result<(), ServiceError>;

    async fn log_event(&self, entry_id: &str, event: NewEvent) -> Result<(), ServiceError>;

    /// Full dump of one entry.
    async fn export(&self, entry_id: &str) -> Result<TrackerEntry, ServiceError>;
}

impl Mutation {
    /// Sends this mutation to `service` for `entry_id`.
    pub async fn apply(&self, service: &dyn DataService, entry_id: &str) -> Result<(), ServiceError> {
        debug!(entry = %entry_id, mutation = %self.describe(), "applying mutation");
        match self {
            Mutation::AddPeriod(period) => service.add_period(entry_id, period.clone()).await.map(|_| ()),
            Mutation::EditCycle(edit) => service.edit_cycle(entry_id, edit.clone()).await,
            Mutation::DeleteCycle { cycle_id } => service.delete_cycle(entry_id, cycle_id).await,
            Mutation::LogEvent(event) => service.log_event(entry_id, event.clone()).await,
        }
    }
}

/// Picks the entry to work on: the configured id when there is one,
/// otherwise the first entry the service knows about.
pub async fn resolve_entry(
    service: &dyn DataService,
    configured: Option<&str>,
) -> Result<Option<String>, ServiceError> {
    if let Some(id) = configured {
        debug!(entry = %id, "using configured entry");
        return Ok(Some(id.to_string()));
    }
    let entries = service.list_entries().await?;
    let picked = entries.into_iter().next().map(|e| e.entry_id);
    match &picked {
        Some(id) => info!(entry = %id, "auto-selected first tracker entry"),
        None => info!("no tracker entries available"),
    }
    Ok(picked)
}
