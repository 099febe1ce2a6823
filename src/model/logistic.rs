//! Logistic regression: a single linear unit trained by full-batch gradient descent

use burn::nn::{Initializer, Linear, LinearConfig};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

use super::loss::weighted_bce;
use super::params::{LogisticParams, Penalty};

/// Train a logistic regression on already-preprocessed inputs.
///
/// Weights start at zero, so training is fully deterministic. `x` is [n, d]; `targets` and
/// `weights` are [n, 1].
pub fn fit_logistic<B: AutodiffBackend>(
    x: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    weights: Tensor<B, 2>,
    params: &LogisticParams,
    device: &B::Device,
) -> Linear<B> {
    let input_dim = x.dims()[1];
    let mut model: Linear<B> = LinearConfig::new(input_dim, 1)
        .with_initializer(Initializer::Zeros)
        .init(device);
    let mut optimizer = SgdConfig::new().init();

    for epoch in 0..params.epochs {
        let logits = model.forward(x.clone());
        let data_loss = weighted_bce(logits, targets.clone(), weights.clone());

        let w = model.weight.val();
        let penalty = match params.penalty {
            Penalty::L1 => w.abs().sum(),
            Penalty::L2 => w.powf_scalar(2.0).sum(),
        };
        let loss = data_loss + penalty.mul_scalar(params.strength);

        if epoch == 0 || epoch + 1 == params.epochs {
            let value: f32 = loss.clone().into_scalar().elem();
            log::trace!("logistic epoch {}/{}: loss={:.4}", epoch + 1, params.epochs, value);
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(params.learning_rate, model, grads);
    }

    model
}
