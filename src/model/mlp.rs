//! Small neural net candidate
//!
//! Architecture: Input(12) → Hidden(h) → ReLU → win logit(1)

use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::loss::weighted_bce;
use super::params::NeuralNetParams;

/// One hidden layer, one logit
#[derive(Module, Debug)]
pub struct WinNet<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> WinNet<B> {
    /// Create a network whose weights are drawn from a seeded generator, so repeated fits on
    /// the same data give the same model.
    pub fn new(device: &B::Device, input_dim: usize, hidden_dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        WinNet {
            hidden: seeded_linear(device, input_dim, hidden_dim, &mut rng),
            output: seeded_linear(device, hidden_dim, 1, &mut rng),
        }
    }

    /// Forward pass, returns logits [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(x));
        self.output.forward(x)
    }
}

// Uniform(-1/sqrt(fan_in), 1/sqrt(fan_in)), the usual linear-layer default
fn seeded_linear<B: Backend>(
    device: &B::Device,
    input_dim: usize,
    output_dim: usize,
    rng: &mut StdRng,
) -> Linear<B> {
    let bound = 1.0 / (input_dim.max(1) as f32).sqrt();
    let weights: Vec<f32> = (0..input_dim * output_dim)
        .map(|_| rng.gen_range(-bound..bound))
        .collect();
    let bias: Vec<f32> = (0..output_dim).map(|_| rng.gen_range(-bound..bound)).collect();

    let mut linear = LinearConfig::new(input_dim, output_dim).init(device);
    linear.weight = Param::from_tensor(
        Tensor::<B, 1>::from_floats(weights.as_slice(), device).reshape([input_dim, output_dim]),
    );
    linear.bias = Some(Param::from_tensor(Tensor::<B, 1>::from_floats(
        bias.as_slice(),
        device,
    )));
    linear
}

/// Train the network by full-batch gradient descent on preprocessed inputs
pub fn fit_net<B: AutodiffBackend>(
    x: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    weights: Tensor<B, 2>,
    params: &NeuralNetParams,
    seed: u64,
    device: &B::Device,
) -> WinNet<B> {
    let input_dim = x.dims()[1];
    let mut model = WinNet::new(device, input_dim, params.hidden, seed);
    let mut optimizer = SgdConfig::new().init();

    for _epoch in 0..params.epochs {
        let logits = model.forward(x.clone());
        let loss = weighted_bce(logits, targets.clone(), weights.clone());

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(params.learning_rate, model, grads);
    }

    model
}
