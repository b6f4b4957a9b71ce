pub mod dates;
pub mod events;
pub mod metrics;
pub mod month_grid;
pub mod presets;
pub mod range;

pub use events::{DayOverlay, group_by_day, group_by_day_in};
pub use metrics::{CycleMetrics, RiskLevel};
pub use month_grid::{DayCell, MonthGrid, MonthView, build_month_grid};
pub use presets::{Preset, last_record};
