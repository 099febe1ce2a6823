//! SQLite feature table
//!
//! One row per focal-team game keyed by game id. The table is rebuilt from scratch on each
//! write in a staging file that is renamed over the live one.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::features::{FeatureVector, RollingStats};
use crate::{GridironError, Result, TeamCode};

const SCHEMA: &str = r#"
    CREATE TABLE feature_rows (
        game_id TEXT PRIMARY KEY,
        season INTEGER NOT NULL,
        week INTEGER NOT NULL,
        date TEXT,
        team TEXT NOT NULL,
        opponent TEXT NOT NULL,
        is_home INTEGER NOT NULL,
        spread REAL,
        moneyline REAL,
        opp_moneyline REAL,
        pts_for_roll REAL,
        pts_against_roll REAL,
        pt_diff_roll REAL,
        won_roll REAL,
        opp_pts_for_roll REAL,
        opp_pts_against_roll REAL,
        opp_pt_diff_roll REAL,
        opp_won_roll REAL,
        won INTEGER
    );

    CREATE INDEX idx_feature_rows_season ON feature_rows(season, week);
"#;

const SELECT_ALL: &str = r#"
    SELECT game_id, season, week, date, team, opponent, is_home,
           spread, moneyline, opp_moneyline,
           pts_for_roll, pts_against_roll, pt_diff_roll, won_roll,
           opp_pts_for_roll, opp_pts_against_roll, opp_pt_diff_roll, opp_won_roll,
           won
    FROM feature_rows
    ORDER BY season, week, game_id
"#;

/// Persisted feature table at a fixed path
#[derive(Debug, Clone)]
pub struct FeatureStore {
    path: PathBuf,
}

impl FeatureStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FeatureStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the table with `rows`
    pub fn write(&self, rows: &[FeatureVector]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let staging = self.path.with_extension("db.staging");
        if staging.exists() {
            std::fs::remove_file(&staging)?;
        }

        if let Err(e) = write_table(&staging, rows) {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }

        std::fs::rename(&staging, &self.path)?;
        log::debug!("Wrote {} feature rows to {}", rows.len(), self.path.display());
        Ok(())
    }

    /// Load every row, ordered by season and week
    pub fn read(&self) -> Result<Vec<FeatureVector>> {
        if !self.path.exists() {
            return Err(GridironError::MissingInput {
                path: self.path.clone(),
            });
        }

        let conn = Connection::open(&self.path)?;
        let mut stmt = conn.prepare(SELECT_ALL)?;
        let rows = stmt
            .query_map([], row_to_feature_vector)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Create the schema in a fresh database at `path` and insert `rows` in one transaction
fn write_table(path: &Path, rows: &[FeatureVector]) -> Result<()> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO feature_rows VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
              ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        )?;
        for r in rows {
            let t = r.team_form;
            let o = r.opponent_form;
            stmt.execute(params![
                r.game_id,
                r.season,
                r.week,
                r.date.map(|d| d.format("%Y-%m-%d").to_string()),
                r.team.as_str(),
                r.opponent.as_str(),
                r.is_home,
                r.spread,
                r.moneyline,
                r.opp_moneyline,
                t.pts_for,
                t.pts_against,
                t.point_diff,
                t.win_rate,
                o.pts_for,
                o.pts_against,
                o.point_diff,
                o.win_rate,
                r.won,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn row_to_feature_vector(row: &Row<'_>) -> rusqlite::Result<FeatureVector> {
    let date: Option<String> = row.get(3)?;
    let team: String = row.get(4)?;
    let opponent: String = row.get(5)?;

    Ok(FeatureVector {
        game_id: row.get(0)?,
        season: row.get(1)?,
        week: row.get(2)?,
        date: date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        team: TeamCode(team),
        opponent: TeamCode(opponent),
        is_home: row.get(6)?,
        spread: row.get(7)?,
        moneyline: row.get(8)?,
        opp_moneyline: row.get(9)?,
        team_form: RollingStats {
            pts_for: row.get(10)?,
            pts_against: row.get(11)?,
            point_diff: row.get(12)?,
            win_rate: row.get(13)?,
        },
        opponent_form: RollingStats {
            pts_for: row.get(14)?,
            pts_against: row.get(15)?,
            point_diff: row.get(16)?,
            win_rate: row.get(17)?,
        },
        won: row.get(18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(game_id: &str, season: i32, won: Option<bool>) -> FeatureVector {
        FeatureVector {
            game_id: game_id.to_string(),
            season,
            week: 4,
            date: NaiveDate::from_ymd_opt(season, 10, 1),
            team: TeamCode::new("NE"),
            opponent: TeamCode::new("NYJ"),
            is_home: true,
            spread: Some(-6.5),
            moneyline: Some(-280.0),
            opp_moneyline: None,
            team_form: RollingStats {
                pts_for: Some(21.25),
                pts_against: Some(17.0),
                point_diff: Some(4.25),
                win_rate: Some(0.75),
            },
            opponent_form: RollingStats {
                pts_for: Some(14.0),
                pts_against: Some(24.5),
                point_diff: Some(-10.5),
                win_rate: Some(0.25),
            },
            won,
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path().join("processed/team_games.db"));
        let rows = vec![sample("b", 2024, None), sample("a", 2023, Some(true))];

        store.write(&rows).unwrap();
        let loaded = store.read().unwrap();

        // Ordered by season
        assert_eq!(loaded, vec![rows[1].clone(), rows[0].clone()]);
    }

    #[test]
    fn test_rewrite_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path().join("team_games.db"));

        store.write(&[sample("a", 2023, Some(true))]).unwrap();
        store.write(&[sample("z", 2024, Some(false))]).unwrap();

        let loaded = store.read().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].game_id, "z");
        assert!(!dir.path().join("team_games.db.staging").exists());
    }

    #[test]
    fn test_duplicate_game_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path().join("team_games.db"));
        let result = store.write(&[sample("a", 2023, None), sample("a", 2023, None)]);
        assert!(matches!(result, Err(GridironError::Database(_))));
        assert!(!store.exists());
        assert!(!dir.path().join("team_games.db.staging").exists());
    }

    #[test]
    fn test_unparseable_stored_date_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeatureStore::new(dir.path().join("team_games.db"));
        store.write(&[sample("a", 2023, Some(true))]).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.execute("UPDATE feature_rows SET date = 'Oct 1st' WHERE game_id = 'a'", [])
            .unwrap();
        drop(conn);

        assert!(matches!(store.read(), Err(GridironError::Database(_))));
    }

    #[test]
    fn test_read_missing_table() {
        let store = FeatureStore::new("/nonexistent/team_games.db");
        assert!(matches!(
            store.read(),
            Err(GridironError::MissingInput { .. })
        ));
    }
}
