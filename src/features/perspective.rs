//! Team-perspective rows
//!
//! Every game is seen twice: once by the home team and once by the away team.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{GameRecord, TeamCode};

/// One game from one team's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRow {
    pub game_id: String,
    pub season: i32,
    pub week: u32,
    pub date: Option<NaiveDate>,
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub is_home: bool,
    pub pts_for: Option<f64>,
    pub pts_against: Option<f64>,
    /// Negative = this team favored
    pub spread: Option<f64>,
    pub moneyline: Option<f64>,
    pub opp_moneyline: Option<f64>,
}

impl TeamGameRow {
    /// Points for minus points against
    pub fn point_diff(&self) -> Option<f64> {
        Some(self.pts_for? - self.pts_against?)
    }

    /// Win flag, undefined until the game is played
    pub fn won(&self) -> Option<bool> {
        Some(self.pts_for? > self.pts_against?)
    }

    pub fn is_completed(&self) -> bool {
        self.pts_for.is_some() && self.pts_against.is_some()
    }

    fn home(record: &GameRecord, home: &TeamCode, away: &TeamCode) -> Self {
        TeamGameRow {
            game_id: record.game_id.clone(),
            season: record.season,
            week: record.week,
            date: record.date,
            team: home.clone(),
            opponent: away.clone(),
            is_home: true,
            pts_for: record.home_score.map(f64::from),
            pts_against: record.away_score.map(f64::from),
            spread: record.spread_line,
            moneyline: record.home_moneyline,
            opp_moneyline: record.away_moneyline,
        }
    }

    fn away(record: &GameRecord, home: &TeamCode, away: &TeamCode) -> Self {
        TeamGameRow {
            game_id: record.game_id.clone(),
            season: record.season,
            week: record.week,
            date: record.date,
            team: away.clone(),
            opponent: home.clone(),
            is_home: false,
            pts_for: record.away_score.map(f64::from),
            pts_against: record.home_score.map(f64::from),
            spread: record.spread_line.map(|s| -s),
            moneyline: record.away_moneyline,
            opp_moneyline: record.home_moneyline,
        }
    }
}

/// Expand games into home and away rows, sorted by (team, season, week).
///
/// Games missing either team code are skipped. Missing scores are kept: such rows have
/// undefined outcomes but still carry schedule and betting context.
pub fn team_perspective_rows(records: &[GameRecord]) -> Vec<TeamGameRow> {
    let mut rows = Vec::with_capacity(records.len() * 2);

    for record in records {
        let (Some(home), Some(away)) = (&record.home_team, &record.away_team) else {
            continue;
        };
        rows.push(TeamGameRow::home(record, home, away));
        rows.push(TeamGameRow::away(record, home, away));
    }

    // Stable, so same-week rows keep schedule order
    rows.sort_by(|a, b| {
        a.team
            .cmp(&b.team)
            .then(a.season.cmp(&b.season))
            .then(a.week.cmp(&b.week))
    });
    rows
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn game(
        id: &str,
        season: i32,
        week: u32,
        home: &str,
        away: &str,
        score: Option<(u32, u32)>,
    ) -> GameRecord {
        GameRecord {
            game_id: id.to_string(),
            season,
            week,
            date: None,
            home_team: Some(TeamCode::new(home)),
            away_team: Some(TeamCode::new(away)),
            home_score: score.map(|(h, _)| h),
            away_score: score.map(|(_, a)| a),
            spread_line: Some(-3.5),
            home_moneyline: Some(-170.0),
            away_moneyline: Some(145.0),
        }
    }

    #[test]
    fn test_row_count_is_twice_complete_games() {
        let mut incomplete = game("g3", 2023, 3, "NE", "BUF", None);
        incomplete.away_team = None;
        let records = vec![
            game("g1", 2023, 1, "NE", "MIA", Some((24, 17))),
            game("g2", 2023, 2, "BUF", "NE", None),
            incomplete,
        ];

        let rows = team_perspective_rows(&records);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.game_id != "g3"));
    }

    #[test]
    fn test_home_away_mirror() {
        let records = vec![game("g1", 2023, 1, "NE", "MIA", Some((24, 17)))];
        let rows = team_perspective_rows(&records);

        let home = rows.iter().find(|r| r.is_home).unwrap();
        let away = rows.iter().find(|r| !r.is_home).unwrap();

        assert_eq!(home.team, TeamCode::new("NE"));
        assert_eq!(away.team, TeamCode::new("MIA"));
        assert_eq!(home.opponent, away.team);
        assert_eq!(home.spread, away.spread.map(|s| -s));
        assert_eq!(home.pts_for, away.pts_against);
        assert_eq!(home.pts_against, away.pts_for);
        assert_eq!(home.moneyline, away.opp_moneyline);
        assert_eq!(home.opp_moneyline, away.moneyline);
        assert_eq!(home.won(), Some(true));
        assert_eq!(away.won(), Some(false));
        assert_eq!(home.point_diff(), Some(7.0));
        assert_eq!(away.point_diff(), Some(-7.0));
    }

    #[test]
    fn test_future_game_has_undefined_outcome() {
        let records = vec![game("g1", 2025, 1, "NE", "LV", None)];
        let rows = team_perspective_rows(&records);

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.won(), None);
            assert_eq!(row.point_diff(), None);
            assert!(row.spread.is_some());
        }
    }

    #[test]
    fn test_sorted_by_team_season_week() {
        let records = vec![
            game("g2", 2024, 1, "NE", "MIA", Some((10, 3))),
            game("g1", 2023, 5, "MIA", "NE", Some((10, 3))),
            game("g0", 2023, 2, "NE", "BUF", Some((10, 3))),
        ];
        let rows = team_perspective_rows(&records);
        let ne: Vec<_> = rows
            .iter()
            .filter(|r| r.team.as_str() == "NE")
            .map(|r| r.game_id.as_str())
            .collect();
        assert_eq!(ne, vec!["g0", "g1", "g2"]);
        // BUF < MIA < NE
        assert_eq!(rows[0].team.as_str(), "BUF");
    }
}
