//! Binary cross-entropy on win probabilities

use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

const EPS: f64 = 1e-7;

/// Row-weighted binary cross-entropy from logits.
///
/// `logits`, `targets` and `weights` are all [batch, 1].
pub fn weighted_bce<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    weights: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let probs = sigmoid(logits).clamp(EPS, 1.0 - EPS);
    let per_row = targets.clone().neg() * probs.clone().log()
        - (targets.neg() + 1.0) * (probs.neg() + 1.0).log();
    (per_row * weights).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::ElementConversion;

    type TestBackend = NdArray<f32>;

    fn column(values: &[f32]) -> Tensor<TestBackend, 2> {
        let device = Default::default();
        Tensor::<TestBackend, 1>::from_floats(values, &device).reshape([values.len(), 1])
    }

    #[test]
    fn test_zero_logit_loss_is_ln2() {
        let loss = weighted_bce(column(&[0.0, 0.0]), column(&[1.0, 0.0]), column(&[1.0, 1.0]));
        let value: f32 = loss.into_scalar().elem();
        assert!((value - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_weights_scale_loss() {
        let plain = weighted_bce(column(&[0.0]), column(&[1.0]), column(&[1.0]));
        let doubled = weighted_bce(column(&[0.0]), column(&[1.0]), column(&[2.0]));
        let plain: f32 = plain.into_scalar().elem();
        let doubled: f32 = doubled.into_scalar().elem();
        assert!((doubled - 2.0 * plain).abs() < 1e-5);
    }
}
