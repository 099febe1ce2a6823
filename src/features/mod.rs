//! Feature extraction
//!
//! Converts schedule records into team-perspective rolling form and classifier-ready rows.

pub mod opponent;
pub mod perspective;
pub mod rolling;
pub mod table;
pub mod vector;

pub use opponent::{merge_opponents, MergedRow};
pub use perspective::{team_perspective_rows, TeamGameRow};
pub use rolling::{add_rolling, RollingRow, RollingStats, DEFAULT_WINDOW};
pub use table::{build_feature_table, FeatureTableBuilder, LeagueTable};
pub use vector::{FeatureRow, FeatureVector, NEUTRAL_VALUE};
