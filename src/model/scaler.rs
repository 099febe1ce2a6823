//! Z-score standardization fitted on training rows

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::features::{FeatureRow, FeatureVector};

/// Per-column mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Standardizer {
    /// Fit on training rows. Constant columns get a unit scale.
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let dim = FeatureVector::DIM;
        let mut sum = vec![0.0f64; dim];
        let mut sum_sq = vec![0.0f64; dim];

        for row in rows {
            for j in 0..dim {
                let v = row[j] as f64;
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let n = rows.len().max(1) as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| {
                let s = (sq / n - m * m).max(0.0).sqrt();
                if s < 1e-8 {
                    1.0
                } else {
                    s as f32
                }
            })
            .collect();

        Standardizer {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
        }
    }

    /// Normalize a [batch, features] tensor: (x - mean) / std
    pub fn normalize<B: Backend>(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = x.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);
        (x - mean) / std
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn row(first: f32, second: f32) -> FeatureRow {
        let mut r = [0.0; FeatureVector::DIM];
        r[0] = first;
        r[1] = second;
        r
    }

    #[test]
    fn test_fit_mean_std() {
        let scaler = Standardizer::fit(&[row(1.0, 5.0), row(3.0, 5.0)]);
        assert!((scaler.mean[0] - 2.0).abs() < 1e-6);
        assert!((scaler.std[0] - 1.0).abs() < 1e-6);
        // Constant column keeps unit scale
        assert_eq!(scaler.std[1], 1.0);
        assert_eq!(scaler.std[5], 1.0);
    }

    #[test]
    fn test_normalize_tensor() {
        let scaler = Standardizer::fit(&[row(1.0, 5.0), row(3.0, 5.0)]);
        let device = Default::default();
        let flat: Vec<f32> = [row(1.0, 5.0), row(3.0, 5.0)].concat();
        let x = Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), &device)
            .reshape([2, FeatureVector::DIM]);

        let normalized = scaler.normalize(x).into_data();
        let values: &[f32] = normalized.as_slice().unwrap();
        assert!((values[0] + 1.0).abs() < 1e-6);
        assert!((values[FeatureVector::DIM] - 1.0).abs() < 1e-6);
        assert!(values[1].abs() < 1e-6);
    }
}
