//! Commands that write through the view controller: add, edit, delete, log
//! and the presets.

use crate::calc::Preset;
use crate::calc::dates::parse_date;
use crate::cmd::Session;
use crate::data::{CycleEdit, Mutation, NewEvent, NewPeriod};
use crate::error::{TrackerError, TrackerResult};
use crate::ui::{Submit, ViewController};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use tracing::instrument;

pub(crate) fn build_period(start: &str, end: Option<&str>, notes: Option<String>) -> TrackerResult<NewPeriod> {
    let start = start.trim();
    if start.is_empty() {
        return Err(TrackerError::MissingStart);
    }
    Ok(NewPeriod {
        start: parse_date(start)?,
        end: end.map(parse_date).transpose()?,
        notes,
    })
}

pub(crate) fn build_edit(
    cycle_id: &str,
    start: Option<&str>,
    end: Option<&str>,
    notes: Option<String>,
) -> TrackerResult<CycleEdit> {
    Ok(CycleEdit {
        cycle_id: cycle_id.to_string(),
        start: start.map(parse_date).transpose()?,
        end: end.map(parse_date).transpose()?,
        notes,
    })
}

/// Submits `plan` and reports the outcome. Failures come back from the
/// controller's state, never as a panic.
pub(crate) async fn apply_plan<W: std::io::Write>(
    controller: &mut ViewController,
    plan: &Mutation,
    out: &mut W,
) -> Result<()> {
    match controller.submit_mutation(plan).await {
        Submit::Applied => {
            writeln!(out, "Done: {}", plan.describe())?;
            if let Some(err) = controller.last_error() {
                writeln!(out, "Warning: reload after write failed: {err}")?;
            }
            Ok(())
        }
        Submit::Failed(err) => bail!("Failed to {}: {err}", plan.describe()),
        Submit::Ignored => bail!("Could not {}: tracker is busy", plan.describe()),
    }
}

async fn submit(session: &Session, plan: Mutation) -> Result<()> {
    let mut controller = session.controller().await?;
    apply_plan(&mut controller, &plan, &mut std::io::stdout()).await
}

#[instrument(skip_all)]
pub async fn add(session: &Session, start: &str, end: Option<&str>, notes: Option<String>) -> Result<()> {
    submit(session, build_period(start, end, notes)?.into()).await
}

#[instrument(skip_all, fields(cycle = %cycle_id))]
pub async fn edit(
    session: &Session,
    cycle_id: &str,
    start: Option<&str>,
    end: Option<&str>,
    notes: Option<String>,
) -> Result<()> {
    if start.is_none() && end.is_none() && notes.is_none() {
        bail!("Nothing to change: pass --start, --end or --notes");
    }
    submit(session, build_edit(cycle_id, start, end, notes)?.into()).await
}

#[instrument(skip_all, fields(cycle = %cycle_id))]
pub async fn delete(session: &Session, cycle_id: &str) -> Result<()> {
    submit(
        session,
        Mutation::DeleteCycle {
            cycle_id: cycle_id.to_string(),
        },
    )
    .await
}

#[instrument(skip_all)]
pub async fn log(session: &Session, protected: bool, notes: Option<String>) -> Result<()> {
    submit(session, Mutation::LogEvent(NewEvent { protected, notes })).await
}

#[instrument(skip_all, fields(preset = %preset.label()))]
pub async fn preset(session: &Session, preset: Preset, today: NaiveDate) -> Result<()> {
    let mut controller = session.controller().await?;
    let plan = controller.plan_preset(preset, today)?;
    apply_plan(&mut controller, &plan, &mut std::io::stdout()).await
}
