use crate::calc::{DayCell, MonthView};
use crate::cmd::Session;
use crate::ui::calendar_view::event_markers;
use anyhow::Result;
use chrono::{Datelike, NaiveDate};

const CELL_WIDTH: usize = 10;

pub async fn run(session: &Session, offset: i32, today: NaiveDate) -> Result<()> {
    let mut controller = session.controller().await?;
    controller.set_month_offset(offset);
    let grid = controller.month_grid(today)?;
    let metrics = controller.metrics(today);
    let events = controller.events_by_day();
    let view = MonthView::assemble(&grid, controller.cycles(), &events, Some(&metrics), today);
    write_month(&view, &mut std::io::stdout())
}

/// Single-character classification shown after the day number.
fn day_flag(cell: &DayCell) -> char {
    if cell.is_period {
        'P'
    } else if cell.is_ovulation {
        'O'
    } else if cell.is_fertile {
        'F'
    } else if cell.is_predicted_period {
        'p'
    } else if !cell.in_month {
        '.'
    } else {
        ' '
    }
}

pub(crate) fn write_month<W: std::io::Write>(view: &MonthView, out: &mut W) -> Result<()> {
    writeln!(out, "{}", view.title)?;
    writeln!(out, "---")?;
    let header: String = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
        .iter()
        .map(|d| format!(" {:<width$}", d, width = CELL_WIDTH - 1))
        .collect();
    writeln!(out, "{}", header.trim_end())?;
    for week in view.weeks() {
        let line: String = week
            .iter()
            .map(|cell| {
                format!(
                    "{}{:>2}{}{:<5} ",
                    if cell.is_today { '>' } else { ' ' },
                    cell.date.day(),
                    day_flag(cell),
                    event_markers(&cell.events)
                )
            })
            .collect();
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out, "---")?;
    writeln!(
        out,
        "P period  p predicted  F fertile  O ovulation  . other month  > today  • event"
    )?;
    Ok(())
}
