//! Cross-validated grid search
//!
//! Every (configuration, fold) pair is an independent job. Jobs run on the rayon pool and
//! share the rows read-only; scores are gathered back in grid order, so the outcome does not
//! depend on scheduling.

use rayon::prelude::*;

use super::candidates::Candidate;
use super::metrics::{accuracy, roc_auc};
use super::split::{select, stratified_folds, Split};
use crate::features::FeatureRow;
use crate::model::PipelineSpec;
use crate::{GridironError, Result};

/// How a fold is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scoring {
    RocAuc,
    Accuracy,
}

/// Outcome of searching one candidate's grid
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best: PipelineSpec,
    pub best_index: usize,
    /// Mean fold score of `best`
    pub best_score: f64,
    /// Mean fold score per grid entry, in grid order
    pub scores: Vec<f64>,
}

/// Fit `spec` on one fold's training rows and score it on the held-out rows
fn score_fold(
    spec: &PipelineSpec,
    rows: &[FeatureRow],
    labels: &[bool],
    fold: &Split,
    seed: u64,
    scoring: Scoring,
) -> Result<f64> {
    let fitted = spec.fit(&select(rows, &fold.train), &select(labels, &fold.train), seed)?;
    let test_rows = select(rows, &fold.test);
    let test_labels = select(labels, &fold.test);

    match scoring {
        Scoring::Accuracy => Ok(accuracy(&fitted.predict(&test_rows)?, &test_labels)),
        Scoring::RocAuc => roc_auc(&fitted.predict_proba(&test_rows)?, &test_labels).ok_or_else(
            || GridironError::InsufficientData("held-out fold contains a single class".into()),
        ),
    }
}

/// Score `spec` on every fold
pub fn cross_validate(
    spec: &PipelineSpec,
    rows: &[FeatureRow],
    labels: &[bool],
    folds: &[Split],
    seed: u64,
    scoring: Scoring,
) -> Result<Vec<f64>> {
    folds
        .par_iter()
        .map(|fold| score_fold(spec, rows, labels, fold, seed, scoring))
        .collect()
}

/// Stratified k-fold grid search scored by ROC AUC.
///
/// The best configuration has the highest mean fold AUC; ties go to the earliest in grid order.
pub fn grid_search(
    candidate: &Candidate,
    rows: &[FeatureRow],
    labels: &[bool],
    k: usize,
    seed: u64,
) -> Result<SearchResult> {
    let specs = candidate.specs();
    if specs.is_empty() {
        return Err(GridironError::Config(format!(
            "candidate {} has an empty grid",
            candidate.name
        )));
    }
    let folds = stratified_folds(labels, k)?;

    let jobs: Vec<(usize, usize)> = (0..specs.len())
        .flat_map(|s| (0..folds.len()).map(move |f| (s, f)))
        .collect();
    let fold_scores: Vec<f64> = jobs
        .par_iter()
        .map(|&(s, f)| score_fold(&specs[s], rows, labels, &folds[f], seed, Scoring::RocAuc))
        .collect::<Result<_>>()?;

    let scores: Vec<f64> = fold_scores
        .chunks(folds.len())
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect();

    let mut best_index = 0;
    for (i, &score) in scores.iter().enumerate() {
        log::debug!("{} [{}] {}: cv auc {:.4}", candidate.name, i, specs[i].classifier, score);
        if score > scores[best_index] {
            best_index = i;
        }
    }

    Ok(SearchResult {
        best: specs[best_index],
        best_index,
        best_score: scores[best_index],
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pipeline::tests::venue_rows;
    use crate::model::{ClassifierParams, LogisticParams, Preprocessing};

    fn frozen() -> ClassifierParams {
        ClassifierParams::Logistic(LogisticParams {
            learning_rate: 0.0,
            epochs: 1,
            ..LogisticParams::default()
        })
    }

    fn trained() -> ClassifierParams {
        ClassifierParams::Logistic(LogisticParams::default())
    }

    #[test]
    fn test_grid_search_prefers_higher_auc() {
        let (rows, labels) = venue_rows();
        let candidate = Candidate::new("lr", Preprocessing::Standardize, vec![frozen(), trained()]);

        let result = grid_search(&candidate, &rows, &labels, 5, 42).unwrap();
        assert_eq!(result.scores.len(), 2);
        assert!((result.scores[0] - 0.5).abs() < 1e-9);
        assert!((result.scores[1] - 1.0).abs() < 1e-9);
        assert_eq!(result.best_index, 1);
        assert_eq!(result.best.classifier, trained());
    }

    #[test]
    fn test_grid_search_tie_goes_to_first() {
        let (rows, labels) = venue_rows();
        let balanced = ClassifierParams::Logistic(LogisticParams {
            learning_rate: 0.0,
            epochs: 1,
            class_weight: crate::model::ClassWeight::Balanced,
            ..LogisticParams::default()
        });
        let candidate = Candidate::new("lr", Preprocessing::Standardize, vec![frozen(), balanced]);

        let result = grid_search(&candidate, &rows, &labels, 5, 42).unwrap();
        assert_eq!(result.scores[0], result.scores[1]);
        assert_eq!(result.best_index, 0);
    }

    #[test]
    fn test_grid_search_needs_enough_rows_per_fold() {
        let (rows, labels) = venue_rows();
        let candidate = Candidate::new("lr", Preprocessing::Standardize, vec![trained()]);
        assert!(matches!(
            grid_search(&candidate, &rows[..6], &labels[..6], 5, 42),
            Err(GridironError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_cross_validate_accuracy() {
        let (rows, labels) = venue_rows();
        let folds = stratified_folds(&labels, 5).unwrap();
        let spec = PipelineSpec {
            preprocessing: Preprocessing::Standardize,
            classifier: trained(),
        };
        let scores = cross_validate(&spec, &rows, &labels, &folds, 0, Scoring::Accuracy).unwrap();
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|&s| (s - 1.0).abs() < 1e-9));
    }
}
