//! View state for the calendar: mode, month offset, load status and the
//! last good snapshot of cycles and events.
//!
//! Service calls are split in two halves so the terminal loop can run them on
//! a runtime and feed the results back later: `begin_*` hands out a ticket and
//! moves the state to `Loading`, the caller runs the matching task, and
//! [`ViewController::apply`] folds the [`Completion`] back in. Every refresh
//! bumps a generation counter, so only the newest refresh can land; anything
//! older, or anything arriving after [`ViewController::dispose`], is dropped.

use crate::calc::{self, CycleMetrics, MonthGrid, Preset};
use crate::data::{CycleListing, CycleRecord, Mutation, PointEvent};
use crate::error::{ServiceError, TrackerResult};
use crate::service::DataService;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Calendar,
    Editor,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Calendar => Mode::Editor,
            Mode::Editor => Mode::Calendar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Error(ServiceError),
}

/// Proof that a refresh was started; only the newest one is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationTicket {
    plan: Mutation,
}

impl MutationTicket {
    pub fn plan(&self) -> &Mutation {
        &self.plan
    }
}

/// Result of a service task, ready to be applied to the controller.
#[derive(Debug)]
pub enum Completion {
    Refreshed(RefreshTicket, Result<CycleListing, ServiceError>),
    Submitted(MutationTicket, Result<(), ServiceError>),
}

/// Outcome of [`ViewController::submit_mutation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submit {
    Applied,
    Failed(ServiceError),
    /// Not started: the controller was busy or disposed.
    Ignored,
}

pub struct ViewController {
    service: Arc<dyn DataService>,
    entry_id: String,
    mode: Mode,
    month_offset: i32,
    status: LoadStatus,
    snapshot: CycleListing,
    generation: u64,
    submitting: bool,
    disposed: bool,
}

impl ViewController {
    pub fn new(service: Arc<dyn DataService>, entry_id: impl Into<String>) -> Self {
        ViewController {
            service,
            entry_id: entry_id.into(),
            mode: Mode::Calendar,
            month_offset: 0,
            status: LoadStatus::Idle,
            snapshot: CycleListing::default(),
            generation: 0,
            submitting: false,
            disposed: false,
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn month_offset(&self) -> i32 {
        self.month_offset
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn last_error(&self) -> Option<&ServiceError> {
        match &self.status {
            LoadStatus::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn snapshot(&self) -> &CycleListing {
        &self.snapshot
    }

    pub fn cycles(&self) -> &[CycleRecord] {
        &self.snapshot.cycles
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Moves the visible month by `delta`; `0` returns to the current month.
    pub fn set_month_offset(&mut self, delta: i32) {
        self.month_offset = if delta == 0 {
            0
        } else {
            self.month_offset.saturating_add(delta)
        };
    }

    /// Stops accepting results. In-flight work may still finish but will not
    /// touch this controller.
    pub fn dispose(&mut self) {
        if !self.disposed {
            debug!(entry = %self.entry_id, "view controller disposed");
        }
        self.disposed = true;
    }

    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.disposed {
            return None;
        }
        self.generation += 1;
        self.status = LoadStatus::Loading;
        debug!(generation = self.generation, "refresh started");
        Some(RefreshTicket {
            generation: self.generation,
        })
    }

    /// Applies a listing. Returns `false` when the result was stale.
    pub fn finish_refresh(&mut self, ticket: RefreshTicket, result: Result<CycleListing, ServiceError>) -> bool {
        if self.disposed || ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "dropping stale refresh result"
            );
            return false;
        }
        match result {
            Ok(listing) => {
                debug!(
                    cycles = listing.cycles.len(),
                    events = listing.sex_events.len(),
                    "refresh completed"
                );
                self.snapshot = listing;
                if !self.submitting {
                    self.status = LoadStatus::Idle;
                }
            }
            Err(err) => {
                warn!(error = %err, "refresh failed; keeping previous snapshot");
                self.status = LoadStatus::Error(err);
            }
        }
        true
    }

    /// Starts a mutation. Only legal while idle.
    pub fn begin_submit(&mut self, plan: &Mutation) -> Option<MutationTicket> {
        if self.disposed || self.submitting || self.status != LoadStatus::Idle {
            debug!(status = ?self.status, "submit ignored; controller busy");
            return None;
        }
        self.submitting = true;
        self.status = LoadStatus::Loading;
        info!(entry = %self.entry_id, mutation = %plan.describe(), "submitting mutation");
        Some(MutationTicket { plan: plan.clone() })
    }

    /// Records the outcome of a mutation. On success the follow-up refresh
    /// ticket is returned; a failed write skips the refresh.
    pub fn finish_submit(&mut self, _ticket: MutationTicket, result: Result<(), ServiceError>) -> Option<RefreshTicket> {
        self.submitting = false;
        if self.disposed {
            return None;
        }
        match result {
            Ok(()) => self.begin_refresh(),
            Err(err) => {
                warn!(error = %err, "mutation failed");
                self.status = LoadStatus::Error(err);
                None
            }
        }
    }

    /// Folds a finished task back in, returning a refresh to run next if any.
    pub fn apply(&mut self, completion: Completion) -> Option<RefreshTicket> {
        match completion {
            Completion::Refreshed(ticket, result) => {
                self.finish_refresh(ticket, result);
                None
            }
            Completion::Submitted(ticket, result) => self.finish_submit(ticket, result),
        }
    }

    /// The service call behind a refresh ticket. Owns everything it needs so
    /// it can be spawned.
    pub fn refresh_task(&self, ticket: RefreshTicket) -> impl Future<Output = Completion> + Send + 'static {
        let service = Arc::clone(&self.service);
        let entry_id = self.entry_id.clone();
        async move {
            let result = service.list_cycles(&entry_id).await;
            Completion::Refreshed(ticket, result)
        }
    }

    pub fn submit_task(&self, ticket: MutationTicket) -> impl Future<Output = Completion> + Send + 'static {
        let service = Arc::clone(&self.service);
        let entry_id = self.entry_id.clone();
        async move {
            let result = ticket.plan.apply(service.as_ref(), &entry_id).await;
            Completion::Submitted(ticket, result)
        }
    }

    /// Reloads the snapshot. Failures end up in [`Self::status`].
    pub async fn refresh(&mut self) {
        if let Some(ticket) = self.begin_refresh() {
            let completion = self.refresh_task(ticket).await;
            self.apply(completion);
        }
    }

    /// Applies `plan` and, when it succeeds, refreshes.
    pub async fn submit_mutation(&mut self, plan: &Mutation) -> Submit {
        let Some(ticket) = self.begin_submit(plan) else {
            return Submit::Ignored;
        };
        let completion = self.submit_task(ticket).await;
        match self.apply(completion) {
            Some(refresh) => {
                let completion = self.refresh_task(refresh).await;
                self.apply(completion);
                Submit::Applied
            }
            None => match self.last_error() {
                Some(err) => Submit::Failed(err.clone()),
                None => Submit::Ignored,
            },
        }
    }

    /// Resolves a preset against the current snapshot.
    pub fn plan_preset(&self, preset: Preset, today: NaiveDate) -> TrackerResult<Mutation> {
        preset.plan(&self.snapshot.cycles, today)
    }

    pub fn month_grid(&self, today: NaiveDate) -> TrackerResult<MonthGrid> {
        calc::build_month_grid(today, self.month_offset)
    }

    pub fn metrics(&self, date: NaiveDate) -> CycleMetrics {
        CycleMetrics::for_date(&self.snapshot.cycles, &self.snapshot.params, date)
    }

    pub fn events_by_day(&self) -> HashMap<NaiveDate, Vec<&PointEvent>> {
        calc::group_by_day(&self.snapshot.sex_events)
    }
}
