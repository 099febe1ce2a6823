//! Preprocessing + classifier pipelines
//!
//! A [`PipelineSpec`] names what to train; fitting it yields a [`FittedPipeline`] that maps
//! feature rows to win probabilities. Training runs on the autodiff backend, the fitted
//! model lives on the plain inference backend.

use burn::module::AutodiffModule;
use burn::nn::Linear;
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::logistic::fit_logistic;
use super::mlp::{fit_net, WinNet};
use super::params::{ClassifierParams, Preprocessing};
use super::scaler::Standardizer;
use super::{InferenceBackend, TrainingBackend};
use crate::features::{FeatureRow, FeatureVector};
use crate::{GridironError, Result};

/// What to train: an optional preprocessing step and a classifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub preprocessing: Preprocessing,
    pub classifier: ClassifierParams,
}

impl PipelineSpec {
    /// Fit on labelled rows. `seed` drives any random weight initialization.
    pub fn fit(&self, rows: &[FeatureRow], labels: &[bool], seed: u64) -> Result<FittedPipeline> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(GridironError::InsufficientData(format!(
                "cannot fit on {} rows with {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let device = <TrainingBackend as Backend>::Device::default();
        let scaler = match self.preprocessing {
            Preprocessing::Standardize => Some(Standardizer::fit(rows)),
            Preprocessing::Passthrough => None,
        };

        let x = rows_to_tensor::<TrainingBackend>(rows, scaler.as_ref(), &device);
        let targets: Vec<f32> = labels.iter().map(|&y| if y { 1.0 } else { 0.0 }).collect();
        let targets =
            Tensor::<TrainingBackend, 1>::from_floats(targets.as_slice(), &device)
                .reshape([labels.len(), 1]);

        let model = match &self.classifier {
            ClassifierParams::Logistic(p) => {
                let weights = weight_column(&p.class_weight.row_weights(labels), &device);
                let linear = fit_logistic(x, targets, weights, p, &device);
                FittedModel::Logistic(linear.valid())
            }
            ClassifierParams::NeuralNet(p) => {
                let weights = weight_column(&p.class_weight.row_weights(labels), &device);
                let net = fit_net(x, targets, weights, p, seed, &device);
                FittedModel::NeuralNet(net.valid())
            }
        };

        Ok(FittedPipeline {
            spec: *self,
            scaler,
            model,
        })
    }
}

fn weight_column(
    weights: &[f32],
    device: &<TrainingBackend as Backend>::Device,
) -> Tensor<TrainingBackend, 2> {
    Tensor::<TrainingBackend, 1>::from_floats(weights, device).reshape([weights.len(), 1])
}

/// Stack rows into a [n, DIM] tensor, standardized when a scaler is given
fn rows_to_tensor<B: Backend>(
    rows: &[FeatureRow],
    scaler: Option<&Standardizer>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    let x = Tensor::<B, 1>::from_floats(flat.as_slice(), device)
        .reshape([rows.len(), FeatureVector::DIM]);
    match scaler {
        Some(s) => s.normalize(x),
        None => x,
    }
}

/// Trained classifier weights
#[derive(Debug, Clone)]
pub enum FittedModel {
    Logistic(Linear<InferenceBackend>),
    NeuralNet(WinNet<InferenceBackend>),
}

impl FittedModel {
    fn logits(&self, x: Tensor<InferenceBackend, 2>) -> Tensor<InferenceBackend, 2> {
        match self {
            FittedModel::Logistic(linear) => linear.forward(x),
            FittedModel::NeuralNet(net) => net.forward(x),
        }
    }
}

/// A fitted pipeline: scaler (if any) + classifier
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    pub spec: PipelineSpec,
    pub scaler: Option<Standardizer>,
    pub model: FittedModel,
}

impl FittedPipeline {
    /// P(win) for each row
    pub fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<f32>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let device = <InferenceBackend as Backend>::Device::default();
        let x = rows_to_tensor::<InferenceBackend>(rows, self.scaler.as_ref(), &device);
        let probs = sigmoid(self.model.logits(x)).reshape([rows.len()]);
        probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| GridironError::Model(format!("failed to read probabilities: {:?}", e)))
    }

    /// Predicted win flag at the 0.5 threshold
    pub fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<bool>> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(|p| p >= 0.5)
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::params::{ClassWeight, LogisticParams, NeuralNetParams};

    /// Home games won, away games lost; moneyline on a large raw scale
    pub(crate) fn venue_rows() -> (Vec<FeatureRow>, Vec<bool>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let home = i % 2 == 0;
            let mut r = [0.0f32; FeatureVector::DIM];
            r[0] = if home { 1.0 } else { 0.0 };
            r[1] = if home { -3.0 } else { 3.0 };
            r[2] = if home { -160.0 } else { 140.0 };
            r[4] = 20.0 + (i % 5) as f32;
            rows.push(r);
            labels.push(home);
        }
        (rows, labels)
    }

    #[test]
    fn test_standardized_logistic_separates_venue() {
        let (rows, labels) = venue_rows();
        let spec = PipelineSpec {
            preprocessing: Preprocessing::Standardize,
            classifier: ClassifierParams::Logistic(LogisticParams::default()),
        };
        let fitted = spec.fit(&rows, &labels, 42).unwrap();
        assert!(fitted.scaler.is_some());

        let predicted = fitted.predict(&rows).unwrap();
        assert_eq!(predicted, labels);
    }

    #[test]
    fn test_neural_net_pipeline_is_reproducible() {
        let (rows, labels) = venue_rows();
        let spec = PipelineSpec {
            preprocessing: Preprocessing::Standardize,
            classifier: ClassifierParams::NeuralNet(NeuralNetParams {
                hidden: 8,
                learning_rate: 0.1,
                epochs: 100,
                class_weight: ClassWeight::Balanced,
            }),
        };
        let a = spec.fit(&rows, &labels, 7).unwrap().predict_proba(&rows).unwrap();
        let b = spec.fit(&rows, &labels, 7).unwrap().predict_proba(&rows).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), rows.len());
    }

    #[test]
    fn test_passthrough_has_no_scaler() {
        let (rows, labels) = venue_rows();
        let spec = PipelineSpec {
            preprocessing: Preprocessing::Passthrough,
            classifier: ClassifierParams::Logistic(LogisticParams {
                learning_rate: 0.0,
                epochs: 1,
                ..LogisticParams::default()
            }),
        };
        let fitted = spec.fit(&rows, &labels, 0).unwrap();
        assert!(fitted.scaler.is_none());
        assert!(fitted
            .predict_proba(&rows)
            .unwrap()
            .iter()
            .all(|p| (p - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_fit_rejects_empty() {
        let spec = PipelineSpec {
            preprocessing: Preprocessing::Standardize,
            classifier: ClassifierParams::Logistic(LogisticParams::default()),
        };
        assert!(matches!(
            spec.fit(&[], &[], 0),
            Err(GridironError::InsufficientData(_))
        ));
    }
}
