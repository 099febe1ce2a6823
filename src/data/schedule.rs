//! Raw schedule reader
//!
//! Reads the league schedule CSV (nflverse `schedules.csv` layout) into [`GameRecord`]s.
//! Extra columns are ignored and empty cells become missing values.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{GameRecord, GridironError, Result, TeamCode};

/// One CSV row, before validation
#[derive(Debug, Deserialize)]
struct RawScheduleRow {
    game_id: String,
    season: i32,
    week: u32,
    gameday: Option<String>,
    home_team: Option<String>,
    away_team: Option<String>,
    // Written as floats ("24.0") when the column has gaps
    home_score: Option<f64>,
    away_score: Option<f64>,
    spread_line: Option<f64>,
    home_moneyline: Option<f64>,
    away_moneyline: Option<f64>,
}

impl RawScheduleRow {
    fn into_record(self) -> Result<GameRecord> {
        let date = match self.gameday.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                GridironError::Parse(format!(
                    "game {}: bad gameday {:?}: {}",
                    self.game_id, raw, e
                ))
            })?),
        };

        Ok(GameRecord {
            date,
            home_team: team_code(self.home_team),
            away_team: team_code(self.away_team),
            home_score: score(self.home_score),
            away_score: score(self.away_score),
            spread_line: self.spread_line,
            home_moneyline: self.home_moneyline,
            away_moneyline: self.away_moneyline,
            game_id: self.game_id,
            season: self.season,
            week: self.week,
        })
    }
}

fn team_code(raw: Option<String>) -> Option<TeamCode> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(TeamCode)
}

fn score(raw: Option<f64>) -> Option<u32> {
    raw.filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s.round() as u32)
}

/// Read schedule records from any CSV source
pub fn read_schedule<R: Read>(reader: R) -> Result<Vec<GameRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<RawScheduleRow>() {
        records.push(row?.into_record()?);
    }
    Ok(records)
}

/// Load the raw schedule file.
///
/// A missing file is fatal: nothing downstream can run without it.
pub fn load_schedule(path: impl AsRef<Path>) -> Result<Vec<GameRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(GridironError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    let records = read_schedule(file)?;
    log::info!("Loaded {} schedule rows from {}", records.len(), path.display());
    Ok(records)
}
