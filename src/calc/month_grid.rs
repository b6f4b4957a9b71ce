use crate::calc::dates::shift_days;
use crate::calc::events::DayOverlay;
use crate::calc::metrics::CycleMetrics;
use crate::calc::range::is_period_day;
use crate::data::{CycleRecord, PointEvent};
use crate::error::{TrackerError, TrackerResult};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Six full weeks, so the grid height never changes between months.
pub const GRID_DAYS: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    pub in_month: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
    pub days: Vec<GridDay>,
}

impl MonthGrid {
    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[GridDay]> {
        self.days.chunks(7)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }
}

/// Builds the 42-day grid for the month `month_offset` months away from
/// `reference`, starting on the Sunday on or before the 1st.
pub fn build_month_grid(reference: NaiveDate, month_offset: i32) -> TrackerResult<MonthGrid> {
    let total = reference.year() as i64 * 12 + reference.month0() as i64 + month_offset as i64;
    let year = i32::try_from(total.div_euclid(12))
        .map_err(|_| TrackerError::DateOutOfRange(format!("month offset {month_offset}")))?;
    let month = total.rem_euclid(12) as u32 + 1;
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TrackerError::DateOutOfRange(format!("month offset {month_offset}")))?;
    let leading = first_of_month.weekday().num_days_from_sunday() as i64;
    let grid_start = shift_days(first_of_month, -leading)?;

    let mut days = Vec::with_capacity(GRID_DAYS);
    let mut current = grid_start;
    for i in 0..GRID_DAYS {
        if i > 0 {
            current = shift_days(current, 1)?;
        }
        days.push(GridDay {
            date: current,
            in_month: current.year() == year && current.month() == month,
        });
    }
    Ok(MonthGrid { year, month, days })
}

/// One rendered calendar cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub is_period: bool,
    pub is_fertile: bool,
    pub is_ovulation: bool,
    pub is_predicted_period: bool,
    pub events: DayOverlay<'a>,
}

/// A month grid with every day classified, ready for any renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthView<'a> {
    pub title: String,
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell<'a>>,
}

impl<'a> MonthView<'a> {
    pub fn assemble(
        grid: &MonthGrid,
        cycles: &[CycleRecord],
        events_by_day: &HashMap<NaiveDate, Vec<&'a PointEvent>>,
        metrics: Option<&CycleMetrics>,
        today: NaiveDate,
    ) -> Self {
        let cells = grid
            .days
            .iter()
            .map(|day| {
                let events = events_by_day
                    .get(&day.date)
                    .map(|evs| DayOverlay::from_events(evs))
                    .unwrap_or_default();
                DayCell {
                    date: day.date,
                    in_month: day.in_month,
                    is_today: day.date == today,
                    is_period: is_period_day(day.date, cycles),
                    is_fertile: metrics.is_some_and(|m| m.is_fertile_day(day.date)),
                    is_ovulation: metrics.is_some_and(|m| m.is_ovulation_day(day.date)),
                    is_predicted_period: metrics.is_some_and(|m| m.is_predicted_period_day(day.date)),
                    events,
                }
            })
            .collect();
        MonthView {
            title: grid.title(),
            year: grid.year,
            month: grid.month,
            cells,
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell<'a>]> {
        self.cells.chunks(7)
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
