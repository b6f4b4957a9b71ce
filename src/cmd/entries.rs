use crate::cmd::Session;
use crate::service::{DataService, EntrySummary};
use anyhow::Result;

pub async fn run(session: &Session) -> Result<()> {
    let entries = session.service.list_entries().await?;
    write_entries(&entries, session.settings.entry_id.as_deref(), &mut std::io::stdout())
}

pub(crate) fn write_entries<W: std::io::Write>(
    entries: &[EntrySummary],
    configured: Option<&str>,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Tracker entries")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<24} {}", "Entry", "Title")?;
    for e in entries {
        let marker = if configured == Some(e.entry_id.as_str()) { "*" } else { " " };
        writeln!(out, "{} {:<24} {}", marker, e.entry_id, e.title)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" })?;
    Ok(())
}
