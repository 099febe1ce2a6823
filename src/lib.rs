//! Single-team NFL win prediction
//!
//! Rolling-form features built from schedule, score and betting-line data, and a small
//! catalogue of classifiers compared by cross-validated grid search.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::features::FeatureVector;

/// League team code (e.g. `NE`, `BUF`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamCode(pub String);

impl TeamCode {
    pub fn new(code: impl Into<String>) -> Self {
        TeamCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve a nickname ("Patriots") or a code ("ne") to a team code.
    ///
    /// Names that match nothing are taken to already be codes.
    pub fn resolve(name: &str) -> Self {
        let trimmed = name.trim();
        let lower = trimmed.to_lowercase();
        TEAM_NICKNAMES
            .iter()
            .find(|(nickname, code)| {
                nickname.to_lowercase() == lower || code.to_lowercase() == lower
            })
            .map(|(_, code)| TeamCode::new(*code))
            .unwrap_or_else(|| TeamCode::new(trimmed.to_uppercase()))
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Nickname to nflverse team code
const TEAM_NICKNAMES: &[(&str, &str)] = &[
    ("Cardinals", "ARI"),
    ("Falcons", "ATL"),
    ("Ravens", "BAL"),
    ("Bills", "BUF"),
    ("Panthers", "CAR"),
    ("Bears", "CHI"),
    ("Bengals", "CIN"),
    ("Browns", "CLE"),
    ("Cowboys", "DAL"),
    ("Broncos", "DEN"),
    ("Lions", "DET"),
    ("Packers", "GB"),
    ("Texans", "HOU"),
    ("Colts", "IND"),
    ("Jaguars", "JAX"),
    ("Chiefs", "KC"),
    ("Raiders", "LV"),
    ("Chargers", "LAC"),
    ("Rams", "LA"),
    ("Dolphins", "MIA"),
    ("Vikings", "MIN"),
    ("Patriots", "NE"),
    ("Saints", "NO"),
    ("Giants", "NYG"),
    ("Jets", "NYJ"),
    ("Eagles", "PHI"),
    ("Steelers", "PIT"),
    ("49ers", "SF"),
    ("Seahawks", "SEA"),
    ("Buccaneers", "TB"),
    ("Titans", "TEN"),
    ("Commanders", "WAS"),
];

/// One scheduled game as it appears in the raw schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub season: i32,
    pub week: u32,
    pub date: Option<NaiveDate>,
    pub home_team: Option<TeamCode>,
    pub away_team: Option<TeamCode>,
    /// None for games not yet played
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Home-relative spread, negative = home favored
    pub spread_line: Option<f64>,
    pub home_moneyline: Option<f64>,
    pub away_moneyline: Option<f64>,
}

impl GameRecord {
    /// Both team codes are present
    pub fn has_teams(&self) -> bool {
        self.home_team.is_some() && self.away_team.is_some()
    }

    /// Both scores are known
    pub fn is_completed(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Whether the given team plays in this game
    pub fn involves(&self, team: &TeamCode) -> bool {
        self.home_team.as_ref() == Some(team) || self.away_team.as_ref() == Some(team)
    }
}

/// Predicted result for the focal team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn from_probability(win_probability: f32) -> Self {
        if win_probability >= 0.5 {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Lose => write!(f, "lose"),
        }
    }
}

/// Model prediction output
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub is_home: bool,
    pub win_probability: f32,
    pub outcome: Outcome,
    /// Feature row the model was given
    pub features: FeatureVector,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required input not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Model not trained - run `gridiron train` first")]
    NotTrained,

    #[error("Model artifact error: {0}")]
    Artifact(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub evaluation: EvaluationConfig,
    pub serving: ServingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub raw_schedule_path: PathBuf,
    pub feature_table_path: PathBuf,
    pub model_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub focal_team: TeamCode,
    pub window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub validation_fraction: f64,
    pub seed: u64,
    pub cv_folds: usize,
    pub exclude_latest_season: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub cv_folds: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServingConfig {
    /// Last season whose games feed serving-time rolling stats.
    /// Defaults to the season before the one being predicted.
    pub stats_season_cutoff: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                raw_schedule_path: PathBuf::from("data/raw/schedules.csv"),
                feature_table_path: PathBuf::from("data/processed/team_games.db"),
                model_dir: PathBuf::from("models"),
            },
            features: FeatureConfig {
                focal_team: TeamCode::new("NE"),
                window: crate::features::DEFAULT_WINDOW,
            },
            training: TrainingConfig {
                validation_fraction: 0.2,
                seed: 42,
                cv_folds: 5,
                exclude_latest_season: true,
            },
            evaluation: EvaluationConfig { cv_folds: 5 },
            serving: ServingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject parameter values no pipeline stage can run with
    pub fn validate(&self) -> Result<()> {
        if self.features.window == 0 {
            return Err(GridironError::Config("features.window must be at least 1".into()));
        }
        let fraction = self.training.validation_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(GridironError::Config(format!(
                "training.validation_fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        if self.training.cv_folds < 2 || self.evaluation.cv_folds < 2 {
            return Err(GridironError::Config("cv_folds must be at least 2".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_nickname_and_code() {
        assert_eq!(TeamCode::resolve("Patriots"), TeamCode::new("NE"));
        assert_eq!(TeamCode::resolve("bills"), TeamCode::new("BUF"));
        assert_eq!(TeamCode::resolve("mia"), TeamCode::new("MIA"));
        // Unknown names pass through as codes
        assert_eq!(TeamCode::resolve("xyz"), TeamCode::new("XYZ"));
    }

    #[test]
    fn test_outcome_threshold() {
        assert_eq!(Outcome::from_probability(0.5), Outcome::Win);
        assert_eq!(Outcome::from_probability(0.49), Outcome::Lose);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.features.focal_team, TeamCode::new("NE"));
        assert_eq!(loaded.features.window, 4);
        assert_eq!(loaded.features.window, crate::features::DEFAULT_WINDOW);
        assert_eq!(loaded.training.seed, 42);
        assert!(loaded.serving.stats_season_cutoff.is_none());
    }

    #[test]
    fn test_config_rejects_bad_fraction() {
        let mut config = Config::default();
        config.training.validation_fraction = 1.5;
        assert!(matches!(config.validate(), Err(GridironError::Config(_))));
    }
}
