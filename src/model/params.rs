//! Hyperparameters for the candidate classifier families

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight penalty for logistic regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Penalty {
    L1,
    L2,
}

/// Per-class loss weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    Uniform,
    /// Weight each class by n / (2 * n_class)
    Balanced,
}

impl ClassWeight {
    /// Per-row weights for the given labels
    pub fn row_weights(&self, labels: &[bool]) -> Vec<f32> {
        match self {
            ClassWeight::Uniform => vec![1.0; labels.len()],
            ClassWeight::Balanced => {
                let n = labels.len() as f32;
                let positives = labels.iter().filter(|&&y| y).count() as f32;
                let negatives = n - positives;
                let w_pos = if positives > 0.0 { n / (2.0 * positives) } else { 1.0 };
                let w_neg = if negatives > 0.0 { n / (2.0 * negatives) } else { 1.0 };
                labels
                    .iter()
                    .map(|&y| if y { w_pos } else { w_neg })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub penalty: Penalty,
    /// Penalty multiplier; 0 disables regularization
    pub strength: f64,
    pub class_weight: ClassWeight,
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for LogisticParams {
    fn default() -> Self {
        LogisticParams {
            penalty: Penalty::L2,
            strength: 0.01,
            class_weight: ClassWeight::Uniform,
            learning_rate: 0.1,
            epochs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuralNetParams {
    pub hidden: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub class_weight: ClassWeight,
}

/// A classifier family together with one point of its search space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ClassifierParams {
    Logistic(LogisticParams),
    NeuralNet(NeuralNetParams),
}

impl fmt::Display for ClassifierParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierParams::Logistic(p) => write!(
                f,
                "logistic(penalty={:?}, strength={}, class_weight={:?}, lr={}, epochs={})",
                p.penalty, p.strength, p.class_weight, p.learning_rate, p.epochs
            ),
            ClassifierParams::NeuralNet(p) => write!(
                f,
                "neural_net(hidden={}, lr={}, epochs={}, class_weight={:?})",
                p.hidden, p.learning_rate, p.epochs, p.class_weight
            ),
        }
    }
}

/// Optional step ahead of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preprocessing {
    Standardize,
    Passthrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_weights() {
        let labels = [true, true, true, false];
        let w = ClassWeight::Balanced.row_weights(&labels);
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-6);
        assert!((w[3] - 2.0).abs() < 1e-6);
        // Weighted class totals are equal
        let pos: f32 = w[..3].iter().sum();
        assert!((pos - w[3]).abs() < 1e-5);
    }

    #[test]
    fn test_params_serialize_with_family_tag() {
        let params = ClassifierParams::Logistic(LogisticParams::default());
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"family\":\"logistic\""));
        let back: ClassifierParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
