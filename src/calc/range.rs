use crate::data::CycleRecord;
use chrono::NaiveDate;

/// Returns true if `day` is in `[start, end]` inclusive.
///
/// No start means no range. An open range (`end == None`) covers only its
/// start day. A reversed range (`start > end`) covers nothing.
pub fn is_day_in_range(day: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    let Some(start) = start else {
        return false;
    };
    let end = end.unwrap_or(start);
    start <= day && day <= end
}

impl CycleRecord {
    pub fn covers(&self, day: NaiveDate) -> bool {
        is_day_in_range(day, Some(self.start), self.end)
    }
}

/// A day is a period day if any record covers it.
pub fn is_period_day(day: NaiveDate, cycles: &[CycleRecord]) -> bool {
    cycles.iter().any(|c| c.covers(day))
}
