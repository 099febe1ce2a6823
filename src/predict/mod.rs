//! Prediction and inference
//!
//! Build serving-time feature rows and score them with the trained model.

pub mod inference;

pub use inference::{format_prediction, MatchupQuery, Predictor, ScheduledPrediction};
