use crate::calc::dates::format_date;
use crate::cmd::Session;
use crate::data::CycleListing;
use anyhow::Result;
use chrono::Local;

pub async fn run(session: &Session) -> Result<()> {
    let controller = session.controller().await?;
    write_cycles(controller.entry_id(), controller.snapshot(), &mut std::io::stdout())
}

pub(crate) fn write_cycles<W: std::io::Write>(entry_id: &str, listing: &CycleListing, out: &mut W) -> Result<()> {
    writeln!(out, "Cycles for {entry_id}")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<38} {:<12} {:<12} {:<6} {}", "Id", "Start", "End", "Days", "Notes")?;
    for c in &listing.cycles {
        let days = c
            .end
            .map(|end| ((end - c.start).num_days() + 1).to_string())
            .unwrap_or_else(|| "open".to_string());
        writeln!(
            out,
            "  {:<38} {:<12} {:<12} {:<6} {}",
            c.id,
            format_date(c.start),
            c.end.map(format_date).unwrap_or_default(),
            days,
            c.notes.as_deref().unwrap_or("")
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} cycle(s)", listing.cycles.len())?;

    if !listing.sex_events.is_empty() {
        writeln!(out)?;
        writeln!(out, "Events")?;
        writeln!(out, "---")?;
        for e in &listing.sex_events {
            let local = e.ts.with_timezone(&Local);
            writeln!(
                out,
                "  {}  {:<11} {}",
                local.format("%Y-%m-%d %H:%M"),
                if e.protected { "protected" } else { "unprotected" },
                e.notes.as_deref().unwrap_or("")
            )?;
        }
        writeln!(out, "---")?;
        writeln!(out, "Total: {} event(s)", listing.sex_events.len())?;
    }
    Ok(())
}
