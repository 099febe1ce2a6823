//! Candidate classifiers and the persisted model artifact

pub mod artifact;
pub mod logistic;
pub mod loss;
pub mod mlp;
pub mod params;
pub mod pipeline;
pub mod scaler;

use burn::backend::{Autodiff, NdArray};

/// Backend fitted models run on
pub type InferenceBackend = NdArray<f32>;

/// Backend models are trained on
pub type TrainingBackend = Autodiff<InferenceBackend>;

pub use artifact::{ArtifactManifest, ModelArtifact};
pub use params::{
    ClassWeight, ClassifierParams, LogisticParams, NeuralNetParams, Penalty, Preprocessing,
};
pub use pipeline::{FittedModel, FittedPipeline, PipelineSpec};
pub use scaler::Standardizer;
