//! Feature table construction
//!
//! Schedule → team-perspective rows → league rolling table → focal-team rows joined with
//! opponent form → persisted table.

use super::opponent::merge_opponents;
use super::perspective::team_perspective_rows;
use super::rolling::{add_rolling, RollingRow, RollingStats};
use super::vector::FeatureVector;
use crate::data::{load_schedule, FeatureStore};
use crate::{Config, FeatureConfig, GameRecord, Result, TeamCode};

/// Rolling form for every team in the league
#[derive(Debug, Clone, Default)]
pub struct LeagueTable {
    rows: Vec<RollingRow>,
}

impl LeagueTable {
    pub fn build(records: &[GameRecord], window: usize) -> Self {
        let rows = add_rolling(&team_perspective_rows(records), window);
        LeagueTable { rows }
    }

    pub fn rows(&self) -> &[RollingRow] {
        &self.rows
    }

    pub fn team_rows<'a>(&'a self, team: &'a TeamCode) -> impl Iterator<Item = &'a RollingRow> {
        self.rows.iter().filter(move |r| &r.row.team == team)
    }

    /// Form stored on the team's most recent completed game with season ≤ `season_cutoff`.
    ///
    /// This is the form the team carried *into* that game.
    pub fn latest_form(&self, team: &TeamCode, season_cutoff: i32) -> Option<RollingStats> {
        self.team_rows(team)
            .filter(|r| r.row.season <= season_cutoff && r.row.is_completed())
            .max_by_key(|r| (r.row.season, r.row.week))
            .map(|r| r.stats)
    }
}

/// Builds the focal team's feature table
#[derive(Debug, Clone)]
pub struct FeatureTableBuilder {
    focal_team: TeamCode,
    window: usize,
}

impl FeatureTableBuilder {
    pub fn new(focal_team: TeamCode, window: usize) -> Self {
        FeatureTableBuilder { focal_team, window }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.focal_team.clone(), config.window)
    }

    /// Feature rows for the focal team, restricted to games where both sides have history
    pub fn build(&self, records: &[GameRecord]) -> Vec<FeatureVector> {
        let league = LeagueTable::build(records, self.window);
        self.build_from_league(&league)
    }

    pub fn build_from_league(&self, league: &LeagueTable) -> Vec<FeatureVector> {
        let focal: Vec<RollingRow> = league.team_rows(&self.focal_team).cloned().collect();
        let merged = merge_opponents(league.rows(), &focal);
        let total = merged.len();

        let rows: Vec<FeatureVector> = merged
            .iter()
            .filter(|m| m.has_history())
            .map(FeatureVector::from_merged)
            .collect();

        log::info!(
            "{} feature rows for {} ({} dropped without prior history)",
            rows.len(),
            self.focal_team,
            total - rows.len()
        );
        rows
    }
}

/// Read the raw schedule, build the focal team's table and persist it
pub fn build_feature_table(config: &Config) -> Result<Vec<FeatureVector>> {
    let records = load_schedule(&config.data.raw_schedule_path)?;
    let rows = FeatureTableBuilder::from_config(&config.features).build(&records);
    FeatureStore::new(&config.data.feature_table_path).write(&rows)?;
    log::info!(
        "Wrote {} rows to {}",
        rows.len(),
        config.data.feature_table_path.display()
    );
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::perspective::tests::game;

    const OPPONENTS: [&str; 3] = ["BUF", "MIA", "NYJ"];

    /// Three seasons of 16 weeks. NE is at home in weeks 1-8 and wins 27-17, and on the
    /// road in weeks 9-16 and loses 13-23. Opponents rotate through a small division.
    pub(crate) fn home_fortress_schedule(first_season: i32) -> Vec<GameRecord> {
        let mut records = Vec::new();
        for season in first_season..first_season + 3 {
            for week in 1..=16u32 {
                let opp = OPPONENTS[(week as usize) % OPPONENTS.len()];
                let id = format!("{}_{:02}", season, week);
                let mut g = if week <= 8 {
                    game(&id, season, week, "NE", opp, Some((27, 17)))
                } else {
                    game(&id, season, week, opp, "NE", Some((23, 13)))
                };
                // Home side favored by 3
                g.spread_line = Some(-3.0);
                records.push(g);
            }
        }
        records
    }

    #[test]
    fn test_build_drops_rows_without_history() {
        let records = home_fortress_schedule(2021);
        let rows = FeatureTableBuilder::new(TeamCode::new("NE"), 4).build(&records);

        // NE's opener and each opponent's first appearance have no history
        assert_eq!(rows.len(), 48 - 3);
        assert!(rows
            .iter()
            .all(|r| r.team_form.is_complete() && r.opponent_form.is_complete()));
        assert!(rows.iter().all(|r| r.team.as_str() == "NE"));
    }

    #[test]
    fn test_win_rate_tracks_home_and_away_stretches() {
        let records = home_fortress_schedule(2021);
        let rows = FeatureTableBuilder::new(TeamCode::new("NE"), 4).build(&records);

        for r in &rows {
            if r.is_home && (5..=8).contains(&r.week) {
                assert_eq!(r.team_form.win_rate, Some(1.0), "game {}", r.game_id);
                assert_eq!(r.won, Some(true));
            }
            if !r.is_home && r.week >= 13 {
                assert_eq!(r.team_form.win_rate, Some(0.0), "game {}", r.game_id);
                assert_eq!(r.won, Some(false));
            }
            // NE-perspective spread flips with venue
            let expected = if r.is_home { -3.0 } else { 3.0 };
            assert_eq!(r.spread, Some(expected));
        }
    }

    #[test]
    fn test_latest_form_uses_last_completed_game() {
        let mut records = home_fortress_schedule(2021);
        // An unplayed game in the next season must be ignored
        records.push(game("2024_01", 2024, 1, "NE", "BUF", None));
        let league = LeagueTable::build(&records, 4);

        let form = league.latest_form(&TeamCode::new("NE"), 2024).unwrap();
        // Entering week 16 of 2023: weeks 12-15 were all road losses
        assert_eq!(form.win_rate, Some(0.0));
        assert_eq!(form.pts_for, Some(13.0));

        assert!(league.latest_form(&TeamCode::new("NE"), 2020).is_none());
        assert!(league.latest_form(&TeamCode::new("KC"), 2024).is_none());
    }

    #[test]
    fn test_build_feature_table_persists() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("schedules.csv");
        std::fs::write(
            &raw,
            "game_id,season,week,gameday,home_team,away_team,home_score,away_score,spread_line,home_moneyline,away_moneyline\n\
             a,2023,1,2023-09-10,NE,MIA,20,10,-3,-150,130\n\
             b,2023,2,2023-09-17,MIA,NE,24,17,-2,-120,100\n\
             c,2023,3,2023-09-24,NE,MIA,30,27,-1,-110,-110\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.data.raw_schedule_path = raw;
        config.data.feature_table_path = dir.path().join("team_games.db");

        let rows = build_feature_table(&config).unwrap();
        assert_eq!(rows.len(), 2);

        let stored = FeatureStore::new(&config.data.feature_table_path).read().unwrap();
        assert_eq!(stored, rows);
    }
}
