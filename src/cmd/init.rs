use crate::calc::dates::shift_days;
use crate::data::{AppSettings, CycleRecord, Persistable, PointEvent, TrackerEntry, TrackerStore};
use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime};
use std::fs;
use std::path::Path;
use tracing::info;

pub const SAMPLE_ENTRY_ID: &str = "default";

pub fn run(dir: &Path, today: NaiveDate) -> Result<()> {
    fs::create_dir_all(dir)?;
    run_in_dir(dir, today)?;
    info!(dir = %dir.display(), "data files initialized");
    println!("Data files initialized successfully.");
    Ok(())
}

/// Writes config.yaml and a sample tracker.json into `dir`.
pub(crate) fn run_in_dir(dir: &Path, today: NaiveDate) -> Result<()> {
    write_config(dir)?;
    write_tracker(dir, today)?;
    Ok(())
}

fn write_config(dir: &Path) -> Result<()> {
    let settings = AppSettings {
        entry_id: Some(SAMPLE_ENTRY_ID.to_string()),
        ..AppSettings::default()
    };
    settings.save_to(dir)
}

fn write_tracker(dir: &Path, today: NaiveDate) -> Result<()> {
    let store = TrackerStore {
        entries: vec![sample_entry(today)?],
    };
    store.save_to(dir)
}

/// Three roughly monthly periods ending before `today`, plus a few events.
fn sample_entry(today: NaiveDate) -> Result<TrackerEntry> {
    let mut entry = TrackerEntry::new(SAMPLE_ENTRY_ID, "Fertility Tracker");
    for (i, (offset, length)) in [(-86, 5), (-57, 4), (-29, 5)].into_iter().enumerate() {
        let start = shift_days(today, offset)?;
        let end = shift_days(start, length - 1)?;
        entry.cycles.push(CycleRecord::new(&format!("sample-{}", i + 1), start, Some(end), None));
    }
    for (offset, protected) in [(-16, false), (-14, true), (-3, false)] {
        if let Some(ts) = evening_of(shift_days(today, offset)?) {
            entry.sex_events.push(PointEvent::new(ts, protected, None));
        }
    }
    Ok(entry)
}

fn evening_of(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    let offset = *Local::now().offset();
    date.and_time(NaiveTime::from_hms_opt(21, 0, 0)?)
        .and_local_timezone(offset)
        .single()
}
