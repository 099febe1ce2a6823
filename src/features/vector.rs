//! Classifier input rows
//!
//! [`FeatureVector`] keeps undefined values as `None`. The neutral-value substitution happens
//! once, in [`FeatureVector::to_row`], which is the only way rows reach a classifier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::opponent::MergedRow;
use super::rolling::RollingStats;
use crate::TeamCode;

/// Value used for any undefined feature at the classifier boundary
pub const NEUTRAL_VALUE: f32 = 0.0;

/// Numeric classifier input, in [`FeatureVector::COLUMNS`] order
pub type FeatureRow = [f32; FeatureVector::DIM];

/// One focal-team game, ready for the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub game_id: String,
    pub season: i32,
    pub week: u32,
    pub date: Option<NaiveDate>,
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub is_home: bool,
    pub spread: Option<f64>,
    pub moneyline: Option<f64>,
    pub opp_moneyline: Option<f64>,
    pub team_form: RollingStats,
    pub opponent_form: RollingStats,
    /// Realized result, when the game has been played
    pub won: Option<bool>,
}

impl FeatureVector {
    pub const DIM: usize = 12;

    /// Column order every model artifact is trained and served with
    pub const COLUMNS: [&'static str; Self::DIM] = [
        "is_home",
        "spread",
        "moneyline",
        "opp_moneyline",
        "pts_for_roll",
        "pts_against_roll",
        "pt_diff_roll",
        "won_roll",
        "opp_pts_for_roll",
        "opp_pts_against_roll",
        "opp_pt_diff_roll",
        "opp_won_roll",
    ];

    /// Build from a merged focal/opponent row. A missing opponent row leaves the
    /// opponent form undefined.
    pub fn from_merged(merged: &MergedRow) -> Self {
        let row = &merged.focal.row;
        FeatureVector {
            game_id: row.game_id.clone(),
            season: row.season,
            week: row.week,
            date: row.date,
            team: row.team.clone(),
            opponent: row.opponent.clone(),
            is_home: row.is_home,
            spread: row.spread,
            moneyline: row.moneyline,
            opp_moneyline: row.opp_moneyline,
            team_form: merged.focal.stats,
            opponent_form: merged.opponent.unwrap_or_default(),
            won: row.won(),
        }
    }

    /// Values in column order with undefined entries replaced by [`NEUTRAL_VALUE`]
    pub fn to_row(&self) -> FeatureRow {
        let fill = |v: Option<f64>| v.map(|x| x as f32).unwrap_or(NEUTRAL_VALUE);
        let t = self.team_form.values();
        let o = self.opponent_form.values();
        [
            if self.is_home { 1.0 } else { 0.0 },
            fill(self.spread),
            fill(self.moneyline),
            fill(self.opp_moneyline),
            fill(t[0]),
            fill(t[1]),
            fill(t[2]),
            fill(t[3]),
            fill(o[0]),
            fill(o[1]),
            fill(o[2]),
            fill(o[3]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_row_column_order_and_defaults() {
        let fv = FeatureVector {
            game_id: "g".into(),
            season: 2024,
            week: 3,
            date: None,
            team: TeamCode::new("NE"),
            opponent: TeamCode::new("MIA"),
            is_home: false,
            spread: Some(3.0),
            moneyline: None,
            opp_moneyline: Some(-150.0),
            team_form: RollingStats {
                pts_for: Some(20.0),
                pts_against: Some(18.0),
                point_diff: Some(2.0),
                win_rate: Some(0.5),
            },
            opponent_form: RollingStats::default(),
            won: None,
        };

        let row = fv.to_row();
        assert_eq!(row.len(), FeatureVector::COLUMNS.len());
        assert_eq!(
            row,
            [0.0, 3.0, 0.0, -150.0, 20.0, 18.0, 2.0, 0.5, 0.0, 0.0, 0.0, 0.0]
        );
    }
}
