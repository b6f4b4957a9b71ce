//! Quick-action edits. Each planner only computes the payload; submitting it
//! is the view controller's job.

use crate::calc::dates::shift_days;
use crate::data::{CycleEdit, CycleRecord, Mutation, NewPeriod};
use crate::error::{TrackerError, TrackerResult};
use chrono::NaiveDate;

/// The record treated as most recent: the last one in the order the data
/// service returned. No re-sorting happens here.
pub fn last_record(cycles: &[CycleRecord]) -> Option<&CycleRecord> {
    cycles.last()
}

pub fn plan_add_fixed_length_period(today: NaiveDate, length_days: i64) -> TrackerResult<NewPeriod> {
    if length_days < 1 {
        return Err(TrackerError::InvalidPresetLength(length_days));
    }
    Ok(NewPeriod {
        start: today,
        end: Some(shift_days(today, length_days - 1)?),
        notes: Some(format!("Preset {length_days}d")),
    })
}

pub fn plan_start_today(today: NaiveDate) -> NewPeriod {
    NewPeriod {
        start: today,
        end: None,
        notes: Some("Started today".to_string()),
    }
}

pub fn plan_end_last_today(last: Option<&CycleRecord>, today: NaiveDate) -> TrackerResult<CycleEdit> {
    let last = last.ok_or(TrackerError::NoActiveCycle)?;
    Ok(CycleEdit {
        cycle_id: last.id.clone(),
        start: None,
        end: Some(today),
        notes: last.notes.clone(),
    })
}

pub fn plan_shift_last_start(last: Option<&CycleRecord>, delta_days: i64) -> TrackerResult<CycleEdit> {
    let last = last.ok_or(TrackerError::NoActiveCycle)?;
    Ok(CycleEdit {
        cycle_id: last.id.clone(),
        start: Some(shift_days(last.start, delta_days)?),
        end: last.end,
        notes: last.notes.clone(),
    })
}

/// A named preset as picked from the UI or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    FixedLength(i64),
    StartToday,
    EndLastToday,
    ShiftLastStart(i64),
}

impl Preset {
    /// Resolves the preset against the current records.
    pub fn plan(&self, cycles: &[CycleRecord], today: NaiveDate) -> TrackerResult<Mutation> {
        Ok(match *self {
            Preset::FixedLength(days) => plan_add_fixed_length_period(today, days)?.into(),
            Preset::StartToday => plan_start_today(today).into(),
            Preset::EndLastToday => plan_end_last_today(last_record(cycles), today)?.into(),
            Preset::ShiftLastStart(delta) => plan_shift_last_start(last_record(cycles), delta)?.into(),
        })
    }

    pub fn label(&self) -> String {
        match self {
            Preset::FixedLength(days) => format!("Add {days}-day period (start today)"),
            Preset::StartToday => "Start period today".to_string(),
            Preset::EndLastToday => "End last period today".to_string(),
            Preset::ShiftLastStart(delta) if *delta < 0 => format!("Shift last start -{}d", -delta),
            Preset::ShiftLastStart(delta) => format!("Shift last start +{delta}d"),
        }
    }
}
