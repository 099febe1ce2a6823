//! Diagnostic report for the persisted model
//!
//! Re-creates the selection split from the same seed, scores the artifact on the validation
//! side, and cross-validates a fixed baseline over the whole labelled set for comparison.
//! Nothing is written.

use std::fmt;

use super::candidates::baseline;
use super::metrics::{mean_std, roc_auc, ClassificationReport, ConfusionMatrix};
use super::search::{cross_validate, Scoring};
use super::selection::LabelledData;
use super::split::{select, stratified_folds, stratified_split};
use crate::features::FeatureVector;
use crate::model::ModelArtifact;
use crate::{Config, GridironError, Result, TrainingConfig};

#[derive(Debug, Clone)]
pub struct DatasetInfo {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub features: Vec<&'static str>,
}

impl DatasetInfo {
    pub fn from_data(data: &LabelledData) -> Self {
        let wins = data.wins();
        DatasetInfo {
            total: data.len(),
            wins,
            losses: data.len() - wins,
            features: FeatureVector::COLUMNS.to_vec(),
        }
    }

    fn pct(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub candidate: String,
    pub validation_rows: usize,
    pub accuracy: f64,
    pub auc: f64,
    pub confusion: ConfusionMatrix,
    pub classification: ClassificationReport,
    /// Baseline accuracy per fold over the full labelled set
    pub baseline_folds: Vec<f64>,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    pub dataset: DatasetInfo,
}

/// Score `artifact` against `data` using the split `training` describes
pub fn evaluate_artifact(
    artifact: &ModelArtifact,
    data: &LabelledData,
    training: &TrainingConfig,
    cv_folds: usize,
) -> Result<EvaluationReport> {
    let split = stratified_split(&data.labels, training.validation_fraction, training.seed)?;
    let val_rows = select(&data.rows, &split.test);
    let val_labels = select(&data.labels, &split.test);

    let probs = artifact.predict_proba(&val_rows)?;
    let predicted: Vec<bool> = probs.iter().map(|&p| p >= 0.5).collect();
    let confusion = ConfusionMatrix::from_predictions(&predicted, &val_labels);
    let auc = roc_auc(&probs, &val_labels).ok_or_else(|| {
        GridironError::InsufficientData("validation set contains a single class".into())
    })?;

    let folds = stratified_folds(&data.labels, cv_folds)?;
    let baseline_folds = cross_validate(
        &baseline(),
        &data.rows,
        &data.labels,
        &folds,
        training.seed,
        Scoring::Accuracy,
    )?;
    let (baseline_mean, baseline_std) = mean_std(&baseline_folds);

    Ok(EvaluationReport {
        candidate: artifact.manifest.candidate.clone(),
        validation_rows: val_labels.len(),
        accuracy: confusion.accuracy(),
        auc,
        classification: ClassificationReport::from_confusion(&confusion),
        confusion,
        baseline_folds,
        baseline_mean,
        baseline_std,
        dataset: DatasetInfo::from_data(data),
    })
}

/// Load the feature table and the persisted model, and report on them
pub fn evaluate(config: &Config) -> Result<EvaluationReport> {
    let artifact = ModelArtifact::load(&config.data.model_dir)?;
    let data = LabelledData::load(config)?;
    evaluate_artifact(&artifact, &data, &config.training, config.evaluation.cv_folds)
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(50))?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "=".repeat(50))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(
            f,
            &format!(
                "VALIDATION SET ({} held out, model: {})",
                self.validation_rows, self.candidate
            ),
        )?;
        writeln!(f, "Accuracy: {:.3}", self.accuracy)?;
        writeln!(f, "ROC AUC:  {:.3}", self.auc)?;
        writeln!(f)?;
        writeln!(f, "Confusion matrix:")?;
        writeln!(f, "{}", self.confusion)?;
        writeln!(f)?;
        writeln!(f, "Classification report:")?;
        writeln!(f, "{}", self.classification)?;
        writeln!(f)?;

        banner(
            f,
            &format!("{}-FOLD CV, BASELINE (full dataset)", self.baseline_folds.len()),
        )?;
        let folds: Vec<String> = self.baseline_folds.iter().map(|a| format!("{:.3}", a)).collect();
        writeln!(f, "Fold accuracies: [{}]", folds.join(", "))?;
        writeln!(
            f,
            "Mean accuracy:   {:.3} +/- {:.3}",
            self.baseline_mean, self.baseline_std
        )?;
        writeln!(f)?;

        banner(f, "DATASET")?;
        let d = &self.dataset;
        writeln!(f, "Total games: {}", d.total)?;
        writeln!(f, "Wins:        {} ({:.1}%)", d.wins, d.pct(d.wins))?;
        writeln!(f, "Losses:      {} ({:.1}%)", d.losses, d.pct(d.losses))?;
        write!(f, "Features:    {}", d.features.join(", "))
    }
}
