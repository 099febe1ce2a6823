//! Model inference for predictions
//!
//! Builds a feature row on demand for any matchup: both teams' latest rolling form plus any
//! betting line the schedule already carries. Misses are filled with the neutral value at the
//! classifier boundary and never fail a request.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::load_schedule;
use crate::features::{FeatureVector, LeagueTable, RollingStats};
use crate::model::ModelArtifact;
use crate::{Config, GameRecord, GridironError, Outcome, Prediction, Result, TeamCode};

/// A matchup to predict, from `team`'s point of view
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupQuery {
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub is_home: bool,
    pub season: i32,
    /// Narrows the betting-line lookup when the teams meet more than once
    pub week: Option<u32>,
}

/// One scheduled game with its prediction
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledPrediction {
    pub game_id: String,
    pub week: u32,
    pub date: Option<NaiveDate>,
    pub prediction: Prediction,
}

/// Predictor for the focal team's games
pub struct Predictor {
    config: Config,
    records: Vec<GameRecord>,
    league: LeagueTable,
    artifact: Option<ModelArtifact>,
}

impl Predictor {
    /// Create a predictor over already-loaded schedule records
    pub fn new(config: Config, records: Vec<GameRecord>, artifact: Option<ModelArtifact>) -> Self {
        let league = LeagueTable::build(&records, config.features.window);
        Predictor {
            config,
            records,
            league,
            artifact,
        }
    }

    /// Load the raw schedule and, if one has been trained, the model artifact
    pub fn load(config: Config) -> Result<Self> {
        let records = load_schedule(&config.data.raw_schedule_path)?;
        let artifact = load_artifact(&config)?;
        Ok(Self::new(config, records, artifact))
    }

    /// Re-read the schedule and the artifact, rebuilding the league rolling table
    pub fn refresh(&mut self) -> Result<()> {
        self.records = load_schedule(&self.config.data.raw_schedule_path)?;
        self.league = LeagueTable::build(&self.records, self.config.features.window);
        self.artifact = load_artifact(&self.config)?;
        log::info!("Predictor refreshed ({} games)", self.records.len());
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn focal_team(&self) -> &TeamCode {
        &self.config.features.focal_team
    }

    /// Most recent season in the schedule, the default season to predict
    pub fn latest_season(&self) -> Option<i32> {
        self.records.iter().map(|r| r.season).max()
    }

    /// Last season whose games feed the rolling form used for `season`
    pub fn stats_cutoff(&self, season: i32) -> i32 {
        self.config.serving.stats_season_cutoff.unwrap_or(season - 1)
    }

    fn form(&self, team: &TeamCode, cutoff: i32) -> RollingStats {
        self.league.latest_form(team, cutoff).unwrap_or_else(|| {
            log::warn!("No completed games for {} up to season {}, using neutral form", team, cutoff);
            RollingStats::default()
        })
    }

    /// The scheduled game matching the query's venue orientation, if any
    fn scheduled_game(&self, query: &MatchupQuery) -> Option<&GameRecord> {
        let (home, away) = if query.is_home {
            (&query.team, &query.opponent)
        } else {
            (&query.opponent, &query.team)
        };
        self.records.iter().find(|r| {
            r.season == query.season
                && query.week.map_or(true, |w| r.week == w)
                && r.home_team.as_ref() == Some(home)
                && r.away_team.as_ref() == Some(away)
        })
    }

    /// Assemble the classifier input for a matchup
    pub fn feature_vector(&self, query: &MatchupQuery) -> FeatureVector {
        let cutoff = self.stats_cutoff(query.season);
        let game = self.scheduled_game(query);

        let (spread, moneyline, opp_moneyline) = match game {
            Some(g) if query.is_home => (g.spread_line, g.home_moneyline, g.away_moneyline),
            Some(g) => (g.spread_line.map(|s| -s), g.away_moneyline, g.home_moneyline),
            None => {
                log::warn!(
                    "No scheduled {} {} {} game in {}, betting lines default to neutral",
                    query.team,
                    if query.is_home { "vs" } else { "at" },
                    query.opponent,
                    query.season
                );
                (None, None, None)
            }
        };

        FeatureVector {
            game_id: game.map(|g| g.game_id.clone()).unwrap_or_else(|| {
                format!("{}_{}_{}", query.season, query.team, query.opponent)
            }),
            season: query.season,
            week: game.map(|g| g.week).or(query.week).unwrap_or(0),
            date: game.and_then(|g| g.date),
            team: query.team.clone(),
            opponent: query.opponent.clone(),
            is_home: query.is_home,
            spread,
            moneyline,
            opp_moneyline,
            team_form: self.form(&query.team, cutoff),
            opponent_form: self.form(&query.opponent, cutoff),
            won: None,
        }
    }

    /// Predict a matchup. Fails only with [`GridironError::NotTrained`] or a model error.
    pub fn predict(&self, query: &MatchupQuery) -> Result<Prediction> {
        let artifact = self.artifact.as_ref().ok_or(GridironError::NotTrained)?;
        let features = self.feature_vector(query);

        let probs = artifact.predict_proba(&[features.to_row()])?;
        let win_probability = probs
            .first()
            .copied()
            .ok_or_else(|| GridironError::Model("model returned no probability".into()))?;

        Ok(Prediction {
            team: query.team.clone(),
            opponent: query.opponent.clone(),
            is_home: query.is_home,
            win_probability,
            outcome: Outcome::from_probability(win_probability),
            features,
        })
    }

    /// Predict the focal team against an opponent given by nickname or code
    pub fn predict_opponent(
        &self,
        opponent: &str,
        is_home: bool,
        season: i32,
        week: Option<u32>,
    ) -> Result<Prediction> {
        let opponent = TeamCode::resolve(opponent);
        if !self.records.iter().any(|r| r.involves(&opponent)) {
            log::warn!(
                "{} does not appear in the schedule; using neutral opponent features",
                opponent
            );
        }
        self.predict(&MatchupQuery {
            team: self.focal_team().clone(),
            opponent,
            is_home,
            season,
            week,
        })
    }

    /// Predict every focal-team game of `season` in the schedule, in week order
    pub fn predict_schedule(&self, season: i32) -> Result<Vec<ScheduledPrediction>> {
        let focal = self.focal_team();
        let mut games: Vec<&GameRecord> = self
            .records
            .iter()
            .filter(|r| r.season == season && r.involves(focal))
            .collect();
        games.sort_by_key(|g| g.week);
        if games.is_empty() {
            log::warn!("No {} games scheduled in {}", focal, season);
        }

        games
            .into_iter()
            .filter_map(|g| {
                let is_home = g.home_team.as_ref() == Some(focal);
                let opponent = if is_home { g.away_team.clone() } else { g.home_team.clone() }?;
                Some((g, is_home, opponent))
            })
            .map(|(g, is_home, opponent)| -> Result<ScheduledPrediction> {
                let prediction = self.predict(&MatchupQuery {
                    team: focal.clone(),
                    opponent,
                    is_home,
                    season,
                    week: Some(g.week),
                })?;
                Ok(ScheduledPrediction {
                    game_id: g.game_id.clone(),
                    week: g.week,
                    date: g.date,
                    prediction,
                })
            })
            .collect()
    }
}

fn load_artifact(config: &Config) -> Result<Option<ModelArtifact>> {
    match ModelArtifact::load(&config.data.model_dir) {
        Ok(artifact) => {
            log::info!(
                "Loaded {} model trained {}",
                artifact.manifest.candidate,
                artifact.manifest.trained_at.format("%Y-%m-%d %H:%M")
            );
            Ok(Some(artifact))
        }
        Err(GridironError::NotTrained) => {
            log::warn!("No trained model in {}", config.data.model_dir.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction) -> String {
    let venue = if pred.is_home { "vs" } else { "at" };
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} {} {}
├─────────────────────────────────────────────────┤
│  Prediction:       {}
│  Win probability:  {:.1}%
└─────────────────────────────────────────────────┘
"#,
        pred.team,
        venue,
        pred.opponent,
        pred.outcome,
        pred.win_probability * 100.0
    )
}
