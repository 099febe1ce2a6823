//! Model training
//!
//! Splits, metrics, cross-validated grid search, candidate selection and evaluation.

pub mod candidates;
pub mod evaluation;
pub mod metrics;
pub mod search;
pub mod selection;
pub mod split;

pub use candidates::{catalogue, Candidate};
pub use evaluation::{evaluate, EvaluationReport};
pub use metrics::{roc_auc, ClassificationReport, ConfusionMatrix};
pub use search::{grid_search, SearchResult};
pub use selection::{train_model, LabelledData, ModelSelector, SelectionReport};
pub use split::{stratified_folds, stratified_split, Split};
