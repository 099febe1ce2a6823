//! Rolling team form
//!
//! Trailing-window means of each team's recent results. A row's rolling values only ever
//! see that team's earlier rows, never the row's own game.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::perspective::TeamGameRow;
use crate::TeamCode;

/// Default trailing window, in games
pub const DEFAULT_WINDOW: usize = 4;

/// Trailing means entering a game. `None` when no earlier game had a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub pts_for: Option<f64>,
    pub pts_against: Option<f64>,
    pub point_diff: Option<f64>,
    pub win_rate: Option<f64>,
}

impl RollingStats {
    pub const DIM: usize = 4;

    /// All four statistics are defined
    pub fn is_complete(&self) -> bool {
        self.pts_for.is_some()
            && self.pts_against.is_some()
            && self.point_diff.is_some()
            && self.win_rate.is_some()
    }

    pub fn values(&self) -> [Option<f64>; Self::DIM] {
        [self.pts_for, self.pts_against, self.point_diff, self.win_rate]
    }
}

/// Per-game inputs to the rolling means
#[derive(Debug, Clone, Copy)]
struct GameResult {
    pts_for: Option<f64>,
    pts_against: Option<f64>,
    point_diff: Option<f64>,
    won: Option<f64>,
}

impl GameResult {
    fn from_row(row: &TeamGameRow) -> Self {
        GameResult {
            pts_for: row.pts_for,
            pts_against: row.pts_against,
            point_diff: row.point_diff(),
            won: row.won().map(|w| if w { 1.0 } else { 0.0 }),
        }
    }
}

/// The last `size` games of one team
#[derive(Debug, Clone)]
pub struct TrailingWindow {
    size: usize,
    games: VecDeque<GameResult>,
}

impl TrailingWindow {
    pub fn new(size: usize) -> Self {
        TrailingWindow {
            size,
            games: VecDeque::with_capacity(size),
        }
    }

    /// Means over the games currently in the window
    pub fn current(&self) -> RollingStats {
        RollingStats {
            pts_for: self.mean(|g| g.pts_for),
            pts_against: self.mean(|g| g.pts_against),
            point_diff: self.mean(|g| g.point_diff),
            win_rate: self.mean(|g| g.won),
        }
    }

    /// Add a game after it has been used as "current"
    pub fn push(&mut self, row: &TeamGameRow) {
        if self.size == 0 {
            return;
        }
        if self.games.len() == self.size {
            self.games.pop_front();
        }
        self.games.push_back(GameResult::from_row(row));
    }

    // Undefined values are skipped, as with a min_periods=1 rolling mean
    fn mean(&self, stat: impl Fn(&GameResult) -> Option<f64>) -> Option<f64> {
        let (sum, count) = self
            .games
            .iter()
            .filter_map(stat)
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

/// A team-game row with the form the team carried into it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingRow {
    pub row: TeamGameRow,
    pub stats: RollingStats,
}

/// Attach shifted rolling means to every row.
///
/// Rows must already be in (team, season, week) order within each team; output keeps the
/// input order. Each team is processed independently.
pub fn add_rolling(rows: &[TeamGameRow], window: usize) -> Vec<RollingRow> {
    let mut windows: HashMap<&TeamCode, TrailingWindow> = HashMap::new();

    rows.iter()
        .map(|row| {
            let trailing = windows
                .entry(&row.team)
                .or_insert_with(|| TrailingWindow::new(window));
            // Read before push: the current game never sees itself
            let stats = trailing.current();
            trailing.push(row);
            RollingRow {
                row: row.clone(),
                stats,
            }
        })
        .collect()
}
