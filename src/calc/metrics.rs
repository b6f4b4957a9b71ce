use crate::data::{CycleRecord, PredictionParams};
use chrono::{Duration, NaiveDate};

/// Days before ovulation at which the fertile window opens.
const FERTILE_LEAD_DAYS: i64 = 5;
/// Days after ovulation at which the fertile window closes.
const FERTILE_TAIL_DAYS: i64 = 1;
/// Margin around the fertile window that is reported as medium risk.
const NEAR_WINDOW_DAYS: i64 = 2;
const IMPLANTATION_START_DAYS: i64 = 6;
const IMPLANTATION_END_DAYS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Predictions derived from the logged cycles as of one date.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMetrics {
    pub date: NaiveDate,
    pub cycle_day: Option<i64>,
    pub cycle_length_avg: Option<f64>,
    pub cycle_length_std: Option<f64>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
    pub next_period: Option<NaiveDate>,
    pub ovulation: Option<NaiveDate>,
    pub fertile_window: Option<(NaiveDate, NaiveDate)>,
    pub implantation_window: Option<(NaiveDate, NaiveDate)>,
    pub risk: Option<RiskLevel>,
    pub risk_label: Option<&'static str>,
}

impl CycleMetrics {
    pub fn for_date(cycles: &[CycleRecord], params: &PredictionParams, date: NaiveDate) -> Self {
        let mut sorted: Vec<&CycleRecord> = cycles.iter().collect();
        sorted.sort_by_key(|c| c.start);

        let lengths = completed_cycle_lengths(&sorted);
        let avg = weighted_avg_length(&lengths, params);
        let std = population_std(&lengths);

        let last = sorted.last();
        let last_start = last.map(|c| c.start);
        let cycle_day = last_start
            .filter(|s| date >= *s)
            .map(|s| (date - s).num_days() + 1);

        let next_period = match (last_start, avg) {
            (Some(s), Some(a)) if a > 0.0 => add_days(s, a.round_ties_even() as i64),
            _ => None,
        };
        let ovulation = next_period.and_then(|n| add_days(n, -params.luteal_days));
        let fertile_window = ovulation.and_then(|o| {
            Some((add_days(o, -FERTILE_LEAD_DAYS)?, add_days(o, FERTILE_TAIL_DAYS)?))
        });
        let implantation_window = ovulation.and_then(|o| {
            Some((add_days(o, IMPLANTATION_START_DAYS)?, add_days(o, IMPLANTATION_END_DAYS)?))
        });

        let (risk, risk_label) = classify_risk(date, fertile_window, implantation_window);

        CycleMetrics {
            date,
            cycle_day,
            cycle_length_avg: avg,
            cycle_length_std: std,
            last_period_start: last_start,
            last_period_end: last.and_then(|c| c.end),
            next_period,
            ovulation,
            fertile_window,
            implantation_window,
            risk,
            risk_label,
        }
    }

    pub fn is_fertile_day(&self, day: NaiveDate) -> bool {
        self.fertile_window.is_some_and(|(s, e)| s <= day && day <= e)
    }

    pub fn is_ovulation_day(&self, day: NaiveDate) -> bool {
        self.ovulation == Some(day)
    }

    pub fn is_predicted_period_day(&self, day: NaiveDate) -> bool {
        self.next_period == Some(day)
    }
}

/// Differences in days between consecutive period starts.
fn completed_cycle_lengths(sorted: &[&CycleRecord]) -> Vec<i64> {
    sorted.windows(2).map(|w| (w[1].start - w[0].start).num_days()).collect()
}

fn mean(values: &[i64]) -> f64 {
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

fn weighted_avg_length(lengths: &[i64], params: &PredictionParams) -> Option<f64> {
    if lengths.is_empty() {
        return None;
    }
    if lengths.len() <= params.recent_window {
        return Some(mean(lengths));
    }
    // A zero window blends over every length.
    let start = if params.recent_window == 0 { 0 } else { lengths.len() - params.recent_window };
    let recent = &lengths[start..];
    Some(params.recent_weight * mean(recent) + params.long_weight * mean(lengths))
}

fn population_std(lengths: &[i64]) -> Option<f64> {
    if lengths.len() < 2 {
        return None;
    }
    let m = mean(lengths);
    let var = lengths.iter().map(|l| (*l as f64 - m).powi(2)).sum::<f64>() / lengths.len() as f64;
    Some(var.sqrt())
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

fn classify_risk(
    date: NaiveDate,
    fertile: Option<(NaiveDate, NaiveDate)>,
    implantation: Option<(NaiveDate, NaiveDate)>,
) -> (Option<RiskLevel>, Option<&'static str>) {
    let mut out = (None, None);
    if let Some((s, e)) = fertile {
        let near_start = add_days(s, -NEAR_WINDOW_DAYS).unwrap_or(s);
        let near_end = add_days(e, NEAR_WINDOW_DAYS).unwrap_or(e);
        out = if s <= date && date <= e {
            (Some(RiskLevel::High), Some("High pregnancy risk today (fertile window)."))
        } else if near_start <= date && date <= near_end {
            (Some(RiskLevel::Medium), Some("Medium pregnancy risk today (near fertile window)."))
        } else {
            (Some(RiskLevel::Low), Some("Safe to have unprotected sex today (low pregnancy risk)."))
        };
    }
    if let Some((s, e)) = implantation
        && s <= date
        && date <= e
    {
        out = (Some(RiskLevel::High), Some("High implantation risk today (post-ovulation)."));
    }
    out
}
