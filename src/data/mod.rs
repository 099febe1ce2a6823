//! Data input and storage
//!
//! Raw schedule reading and the persisted feature table.

pub mod feature_store;
pub mod schedule;

pub use feature_store::FeatureStore;
pub use schedule::{load_schedule, read_schedule};
