//! Model selection
//!
//! Reads the persisted feature table, holds out a stratified validation set, grid-searches
//! every candidate on the remaining rows and keeps the one with the best validation AUC.

use std::fmt;

use super::candidates::{catalogue, Candidate};
use super::metrics::{accuracy, roc_auc};
use super::search::grid_search;
use super::split::{select, stratified_split};
use crate::data::FeatureStore;
use crate::features::{FeatureRow, FeatureVector};
use crate::model::{ClassifierParams, FittedPipeline, ModelArtifact};
use crate::{Config, GridironError, Result, TrainingConfig};

/// Feature rows with a known outcome, ready for fitting
#[derive(Debug, Clone, Default)]
pub struct LabelledData {
    pub rows: Vec<FeatureRow>,
    pub labels: Vec<bool>,
    /// Season excluded as "current", if any
    pub excluded_season: Option<i32>,
}

impl LabelledData {
    /// Keep rows whose outcome is known, optionally dropping the latest season in the table
    pub fn from_table(table: &[FeatureVector], exclude_latest_season: bool) -> Self {
        let excluded_season = if exclude_latest_season {
            table.iter().map(|r| r.season).max()
        } else {
            None
        };

        let mut data = LabelledData {
            excluded_season,
            ..Default::default()
        };
        for row in table {
            if Some(row.season) == excluded_season {
                continue;
            }
            if let Some(won) = row.won {
                data.rows.push(row.to_row());
                data.labels.push(won);
            }
        }
        data
    }

    pub fn load(config: &Config) -> Result<Self> {
        let store = FeatureStore::new(&config.data.feature_table_path);
        let table = store.read()?;
        let data = Self::from_table(&table, config.training.exclude_latest_season);
        log::info!(
            "Loaded {} labelled rows of {} from {}{}",
            data.len(),
            table.len(),
            store.path().display(),
            data.excluded_season
                .map(|s| format!(" (season {} excluded)", s))
                .unwrap_or_default()
        );
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn wins(&self) -> usize {
        self.labels.iter().filter(|&&y| y).count()
    }
}

/// How one candidate fared
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub name: String,
    pub params: ClassifierParams,
    pub cv_auc: f64,
    pub validation_accuracy: f64,
    pub validation_auc: f64,
}

/// Index of the highest validation AUC; earlier candidates win ties
pub fn pick_winner(summaries: &[CandidateSummary]) -> Option<usize> {
    let mut winner: Option<usize> = None;
    for (i, s) in summaries.iter().enumerate() {
        match winner {
            Some(w) if s.validation_auc <= summaries[w].validation_auc => {}
            _ => winner = Some(i),
        }
    }
    winner
}

#[derive(Debug, Clone)]
pub struct SelectionReport {
    pub train_rows: usize,
    pub validation_rows: usize,
    pub candidates: Vec<CandidateSummary>,
    pub winner: usize,
}

impl SelectionReport {
    pub fn winner(&self) -> &CandidateSummary {
        &self.candidates[self.winner]
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Model selection ({} train / {} validation rows)",
            self.train_rows, self.validation_rows
        )?;
        for (i, c) in self.candidates.iter().enumerate() {
            let marker = if i == self.winner { "*" } else { " " };
            writeln!(
                f,
                "{} {:<20} cv auc {:.3} | val acc {:.3} | val auc {:.3} | {}",
                marker, c.name, c.cv_auc, c.validation_accuracy, c.validation_auc, c.params
            )?;
        }
        let w = self.winner();
        write!(f, "Best model: {} (val auc {:.3})", w.name, w.validation_auc)
    }
}

/// Runs the candidate search on labelled rows
pub struct ModelSelector {
    candidates: Vec<Candidate>,
    validation_fraction: f64,
    seed: u64,
    cv_folds: usize,
}

impl ModelSelector {
    pub fn new(config: &TrainingConfig) -> Self {
        ModelSelector {
            candidates: catalogue(),
            validation_fraction: config.validation_fraction,
            seed: config.seed,
            cv_folds: config.cv_folds,
        }
    }

    /// Replace the default catalogue
    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Search every candidate and return the winner, refit on the training side of the split
    pub fn select(&self, data: &LabelledData) -> Result<(ModelArtifact, SelectionReport)> {
        if self.candidates.is_empty() {
            return Err(GridironError::Config("no candidates to select from".into()));
        }

        let split = stratified_split(&data.labels, self.validation_fraction, self.seed)?;
        let train_rows = select(&data.rows, &split.train);
        let train_labels = select(&data.labels, &split.train);
        let val_rows = select(&data.rows, &split.test);
        let val_labels = select(&data.labels, &split.test);

        let mut summaries = Vec::with_capacity(self.candidates.len());
        let mut pipelines: Vec<FittedPipeline> = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            log::info!(
                "Searching {} ({} configurations, {}-fold CV)",
                candidate.name,
                candidate.grid.len(),
                self.cv_folds
            );
            let search = grid_search(
                candidate,
                &train_rows,
                &train_labels,
                self.cv_folds,
                self.seed,
            )?;
            let pipeline = search.best.fit(&train_rows, &train_labels, self.seed)?;

            let probs = pipeline.predict_proba(&val_rows)?;
            let predicted: Vec<bool> = probs.iter().map(|&p| p >= 0.5).collect();
            let validation_accuracy = accuracy(&predicted, &val_labels);
            let validation_auc = roc_auc(&probs, &val_labels).ok_or_else(|| {
                GridironError::InsufficientData("validation set contains a single class".into())
            })?;

            log::info!("  best cv auc:    {:.3}", search.best_score);
            log::info!("  val accuracy:   {:.3}", validation_accuracy);
            log::info!("  val auc:        {:.3}", validation_auc);
            log::info!("  best params:    {}", search.best.classifier);

            summaries.push(CandidateSummary {
                name: candidate.name.clone(),
                params: search.best.classifier,
                cv_auc: search.best_score,
                validation_accuracy,
                validation_auc,
            });
            pipelines.push(pipeline);
        }

        let winner = pick_winner(&summaries)
            .ok_or_else(|| GridironError::Model("no candidate produced a model".into()))?;
        let best = &summaries[winner];
        log::info!(
            "Best model: {} (val auc {:.3})",
            best.name,
            best.validation_auc
        );

        let pipeline = pipelines.swap_remove(winner);
        let artifact = ModelArtifact::new(
            best.name.clone(),
            pipeline,
            best.cv_auc,
            best.validation_accuracy,
            best.validation_auc,
        );
        let report = SelectionReport {
            train_rows: split.train.len(),
            validation_rows: split.test.len(),
            candidates: summaries,
            winner,
        };
        Ok((artifact, report))
    }
}

/// Load the feature table, select a model and persist the winner
pub fn train_model(config: &Config, selector: &ModelSelector) -> Result<SelectionReport> {
    let data = LabelledData::load(config)?;
    let (artifact, report) = selector.select(&data)?;
    artifact.save(&config.data.model_dir)?;
    Ok(report)
}
