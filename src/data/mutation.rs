use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payload for creating a period; the service assigns the id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewPeriod {
    pub start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update of an existing cycle. `None` leaves the field untouched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CycleEdit {
    pub cycle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewEvent {
    pub protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A write the view controller can submit to the data service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    AddPeriod(NewPeriod),
    EditCycle(CycleEdit),
    DeleteCycle { cycle_id: String },
    LogEvent(NewEvent),
}

impl Mutation {
    /// Short label used in logs and status lines.
    pub fn describe(&self) -> String {
        match self {
            Mutation::AddPeriod(p) => format!("add period starting {}", p.start.format("%Y-%m-%d")),
            Mutation::EditCycle(e) => format!("edit cycle {}", e.cycle_id),
            Mutation::DeleteCycle { cycle_id } => format!("delete cycle {cycle_id}"),
            Mutation::LogEvent(ev) if ev.protected => "log protected event".to_string(),
            Mutation::LogEvent(_) => "log unprotected event".to_string(),
        }
    }
}

impl From<NewPeriod> for Mutation {
    fn from(p: NewPeriod) -> Self {
        Mutation::AddPeriod(p)
    }
}

impl From<CycleEdit> for Mutation {
    fn from(e: CycleEdit) -> Self {
        Mutation::EditCycle(e)
    }
}

impl From<NewEvent> for Mutation {
    fn from(e: NewEvent) -> Self {
        Mutation::LogEvent(e)
    }
}
