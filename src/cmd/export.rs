use crate::cmd::Session;
use crate::data::TrackerEntry;
use crate::service::DataService;
use anyhow::Result;

/// Dumps the resolved entry as pretty JSON.
pub async fn run(session: &Session) -> Result<()> {
    let entry_id = session.entry_id().await?;
    let entry = session.service.export(&entry_id).await?;
    write_export(&entry, &mut std::io::stdout())
}

pub(crate) fn write_export<W: std::io::Write>(entry: &TrackerEntry, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, entry)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CycleRecord;
    use chrono::NaiveDate;

    #[test]
    fn test_write_export_is_parseable() {
        let mut entry = TrackerEntry::new("e", "Test");
        entry.cycles.push(CycleRecord::new(
            "c1",
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            None,
            Some(""),
        ));
        let mut buf = Vec::new();
        write_export(&entry, &mut buf).unwrap();
        let parsed: TrackerEntry = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(parsed.cycles[0].notes, Some(String::new()));
    }
}
