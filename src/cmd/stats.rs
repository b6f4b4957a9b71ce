use crate::calc::CycleMetrics;
use crate::calc::dates::format_date;
use crate::cmd::Session;
use anyhow::Result;
use chrono::NaiveDate;

pub async fn run(session: &Session, date: NaiveDate) -> Result<()> {
    let controller = session.controller().await?;
    let metrics = controller.metrics(date);
    write_stats(controller.entry_id(), controller.cycles().len(), &metrics, &mut std::io::stdout())
}

fn or_dash(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn write_stats<W: std::io::Write>(
    entry_id: &str,
    cycle_count: usize,
    m: &CycleMetrics,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Cycle Stats for {} as of {}", entry_id, format_date(m.date))?;
    writeln!(out, "---")?;
    writeln!(out, "{:<24} {}", "Recorded cycles:", cycle_count)?;
    writeln!(
        out,
        "{:<24} {}",
        "Cycle day:",
        m.cycle_day.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    )?;
    writeln!(out, "{:<24} {}", "Last period start:", or_dash(m.last_period_start))?;
    writeln!(out, "{:<24} {}", "Last period end:", or_dash(m.last_period_end))?;
    writeln!(out, "---")?;
    match (m.cycle_length_avg, m.cycle_length_std) {
        (Some(avg), Some(std)) => writeln!(out, "{:<24} {:.1} days (± {:.1})", "Average length:", avg, std)?,
        (Some(avg), None) => writeln!(out, "{:<24} {:.1} days", "Average length:", avg)?,
        _ => writeln!(out, "{:<24} not enough data", "Average length:")?,
    }
    writeln!(out, "{:<24} {}", "Next period:", or_dash(m.next_period))?;
    writeln!(out, "{:<24} {}", "Ovulation:", or_dash(m.ovulation))?;
    match m.fertile_window {
        Some((s, e)) => writeln!(out, "{:<24} {} - {}", "Fertile window:", format_date(s), format_date(e))?,
        None => writeln!(out, "{:<24} -", "Fertile window:")?,
    }
    match m.implantation_window {
        Some((s, e)) => writeln!(out, "{:<24} {} - {}", "Implantation window:", format_date(s), format_date(e))?,
        None => writeln!(out, "{:<24} -", "Implantation window:")?,
    }
    writeln!(out, "---")?;
    match (m.risk, m.risk_label) {
        (Some(level), Some(label)) => writeln!(out, "{:<24} {} ({})", "Risk:", level.as_str(), label)?,
        (Some(level), None) => writeln!(out, "{:<24} {}", "Risk:", level.as_str())?,
        _ => writeln!(out, "{:<24} unknown", "Risk:")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CycleRecord, PredictionParams};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn render(cycles: &[CycleRecord], date: NaiveDate) -> String {
        let m = CycleMetrics::for_date(cycles, &PredictionParams::default(), date);
        let mut buf = Vec::new();
        write_stats("e", cycles.len(), &m, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_stats_without_cycles() {
        let out = render(&[], d(2025, 9, 10));
        assert!(out.contains("Cycle Stats for e as of 2025-09-10"));
        assert!(out.contains("not enough data"));
        assert!(out.contains("unknown"));
    }

    #[test]
    fn test_write_stats_regular_cycle() {
        let cycles = vec![
            CycleRecord::new("a", d(2025, 7, 4), Some(d(2025, 7, 8)), None),
            CycleRecord::new("b", d(2025, 8, 1), Some(d(2025, 8, 5)), None),
        ];
        let out = render(&cycles, d(2025, 8, 10));
        assert!(out.contains("28.0 days"));
        assert!(out.contains("2025-08-29"));
        assert!(out.contains("2025-08-15"));
        assert!(out.contains("2025-08-10 - 2025-08-16"));
        assert!(out.contains("high"));
    }

    #[test]
    fn test_write_stats_shows_std_with_three_cycles() {
        let cycles = vec![
            CycleRecord::new("a", d(2025, 6, 1), None, None),
            CycleRecord::new("b", d(2025, 6, 29), None, None),
            CycleRecord::new("c", d(2025, 7, 29), None, None),
        ];
        let out = render(&cycles, d(2025, 8, 1));
        assert!(out.contains("29.0 days (± 1.0)"));
    }
}
