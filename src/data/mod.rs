pub mod app_settings;
pub mod cycle;
pub mod mutation;
pub mod persistence;
pub mod store;

pub use app_settings::AppSettings;
pub use cycle::{CycleListing, CycleRecord, PointEvent, PredictionParams};
pub use mutation::{CycleEdit, Mutation, NewEvent, NewPeriod};
pub use persistence::Persistable;
pub use store::{TrackerEntry, TrackerStore};
