//! Opponent form lookup
//!
//! Pairs a focal-team row with the opponent's rolling stats from the *same* (season, week),
//! so bye weeks and schedule gaps cannot shift an opponent's form onto the wrong game.

use std::collections::HashMap;

use super::rolling::{RollingRow, RollingStats};
use crate::TeamCode;

/// (team, season, week) → rolling stats, built from the league-wide table
pub struct OpponentIndex<'a> {
    by_key: HashMap<(&'a TeamCode, i32, u32), &'a RollingStats>,
}

impl<'a> OpponentIndex<'a> {
    pub fn new(league: &'a [RollingRow]) -> Self {
        let mut by_key = HashMap::with_capacity(league.len());
        for r in league {
            // First row in table order wins on duplicate keys
            by_key
                .entry((&r.row.team, r.row.season, r.row.week))
                .or_insert(&r.stats);
        }
        OpponentIndex { by_key }
    }

    pub fn get(&self, team: &TeamCode, season: i32, week: u32) -> Option<RollingStats> {
        self.by_key.get(&(team, season, week)).map(|s| **s)
    }
}

/// A focal row joined with its opponent's form. `opponent` is `None` on a lookup miss.
#[derive(Debug, Clone)]
pub struct MergedRow {
    pub focal: RollingRow,
    pub opponent: Option<RollingStats>,
}

impl MergedRow {
    /// Both sides carry a full set of rolling stats
    pub fn has_history(&self) -> bool {
        self.focal.stats.is_complete()
            && self.opponent.map(|o| o.is_complete()).unwrap_or(false)
    }
}

/// Join each focal row with the opponent's row at the same season and week
pub fn merge_opponents(league: &[RollingRow], focal: &[RollingRow]) -> Vec<MergedRow> {
    let index = OpponentIndex::new(league);

    focal
        .iter()
        .map(|r| {
            let opponent = index.get(&r.row.opponent, r.row.season, r.row.week);
            if opponent.is_none() {
                log::debug!(
                    "No opponent row for {} in {} week {}",
                    r.row.opponent,
                    r.row.season,
                    r.row.week
                );
            }
            MergedRow {
                focal: r.clone(),
                opponent,
            }
        })
        .collect()
}
