//! Persisted model artifact
//!
//! An artifact directory holds `win_model.json` (everything needed to rebuild the pipeline)
//! and the module weights it names, `win_model_<timestamp>.mpk`. Each save writes a fresh
//! weights file, so renaming the staged manifest over `win_model.json` is the only step that
//! changes which model is served. Weights no manifest refers to are removed afterwards.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::nn::LinearConfig;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::Backend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mlp::WinNet;
use super::params::ClassifierParams;
use super::pipeline::{FittedModel, FittedPipeline, PipelineSpec};
use super::scaler::Standardizer;
use super::InferenceBackend;
use crate::features::{FeatureRow, FeatureVector};
use crate::{GridironError, Result};

const MODEL_STEM: &str = "win_model";
const STAGING_STEM: &str = "win_model_staging";
const WEIGHTS_PREFIX: &str = "win_model_";

/// Everything about a fitted pipeline except its weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub candidate: String,
    pub spec: PipelineSpec,
    pub scaler: Option<Standardizer>,
    pub columns: Vec<String>,
    pub cv_auc: f64,
    pub validation_accuracy: f64,
    pub validation_auc: f64,
    pub trained_at: DateTime<Utc>,
    /// Stem of the weights file in the artifact directory, without the `.mpk` extension
    pub weights: String,
}

/// A fitted pipeline plus its provenance
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub manifest: ArtifactManifest,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    pub fn new(
        candidate: impl Into<String>,
        pipeline: FittedPipeline,
        cv_auc: f64,
        validation_accuracy: f64,
        validation_auc: f64,
    ) -> Self {
        let trained_at = Utc::now();
        let manifest = ArtifactManifest {
            candidate: candidate.into(),
            spec: pipeline.spec,
            scaler: pipeline.scaler.clone(),
            columns: FeatureVector::COLUMNS.iter().map(|c| c.to_string()).collect(),
            cv_auc,
            validation_accuracy,
            validation_auc,
            trained_at,
            weights: format!("{}{}", WEIGHTS_PREFIX, trained_at.format("%Y%m%dT%H%M%S%9f")),
        };
        ModelArtifact { manifest, pipeline }
    }

    pub fn manifest_path(dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", MODEL_STEM))
    }

    /// Weights file named by `manifest`
    pub fn weights_path(dir: &Path, manifest: &ArtifactManifest) -> PathBuf {
        dir.join(format!("{}.mpk", manifest.weights))
    }

    /// Whether `dir` holds a committed manifest
    pub fn exists(dir: &Path) -> bool {
        Self::manifest_path(dir).exists()
    }

    pub fn predict_proba(&self, rows: &[FeatureRow]) -> Result<Vec<f32>> {
        self.pipeline.predict_proba(rows)
    }

    /// Write the artifact into `dir`, replacing any previous one.
    ///
    /// On error the previously saved artifact is left in place and still loads.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let weights = Self::weights_path(dir, &self.manifest);
        let fresh_weights = !weights.exists();
        let staging_manifest = dir.join(format!("{}.json", STAGING_STEM));

        if let Err(e) = self.stage(dir, &staging_manifest) {
            // Nothing references freshly written weights yet
            if fresh_weights {
                let _ = std::fs::remove_file(&weights);
            }
            let _ = std::fs::remove_file(&staging_manifest);
            return Err(e);
        }

        remove_stale_weights(dir, &self.manifest.weights);
        log::info!(
            "Saved {} model to {}",
            self.manifest.candidate,
            dir.display()
        );
        Ok(())
    }

    fn stage(&self, dir: &Path, staging_manifest: &Path) -> Result<()> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

        // The recorder appends the .mpk extension itself
        let base = dir.join(&self.manifest.weights);
        let result = match &self.pipeline.model {
            FittedModel::Logistic(linear) => recorder.record(linear.clone().into_record(), base),
            FittedModel::NeuralNet(net) => recorder.record(net.clone().into_record(), base),
        };
        result.map_err(|e| GridironError::Artifact(format!("failed to write weights: {}", e)))?;

        std::fs::write(
            staging_manifest,
            serde_json::to_string_pretty(&self.manifest)?,
        )?;
        std::fs::rename(staging_manifest, Self::manifest_path(dir))?;
        Ok(())
    }

    /// Load the artifact from `dir`. A missing artifact is [`GridironError::NotTrained`].
    pub fn load(dir: &Path) -> Result<Self> {
        if !Self::exists(dir) {
            return Err(GridironError::NotTrained);
        }

        let manifest: ArtifactManifest =
            serde_json::from_str(&std::fs::read_to_string(Self::manifest_path(dir))?)?;
        if manifest.columns.len() != FeatureVector::DIM
            || manifest
                .columns
                .iter()
                .zip(FeatureVector::COLUMNS.iter())
                .any(|(a, b)| a != b)
        {
            return Err(GridironError::Artifact(format!(
                "feature columns {:?} do not match {:?}",
                manifest.columns,
                FeatureVector::COLUMNS
            )));
        }

        let device = <InferenceBackend as Backend>::Device::default();
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let weights = Self::weights_path(dir, &manifest);
        if !weights.exists() {
            return Err(GridironError::Artifact(format!(
                "weights file {} is missing",
                weights.display()
            )));
        }
        let base = dir.join(&manifest.weights);
        let load_err = |e: burn::record::RecorderError| {
            GridironError::Artifact(format!("failed to read weights: {}", e))
        };

        let model = match manifest.spec.classifier {
            ClassifierParams::Logistic(_) => {
                let record = recorder.load(base, &device).map_err(load_err)?;
                let linear = LinearConfig::new(FeatureVector::DIM, 1).init::<InferenceBackend>(&device);
                FittedModel::Logistic(linear.load_record(record))
            }
            ClassifierParams::NeuralNet(p) => {
                let record = recorder.load(base, &device).map_err(load_err)?;
                let net = WinNet::<InferenceBackend>::new(&device, FeatureVector::DIM, p.hidden, 0);
                FittedModel::NeuralNet(net.load_record(record))
            }
        };

        let pipeline = FittedPipeline {
            spec: manifest.spec,
            scaler: manifest.scaler.clone(),
            model,
        };
        Ok(ModelArtifact { manifest, pipeline })
    }
}

/// Delete weights files other than `keep`; failures only leave clutter behind
fn remove_stale_weights(dir: &Path, keep: &str) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Could not list {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let stale = path.extension().is_some_and(|ext| ext == "mpk")
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.starts_with(WEIGHTS_PREFIX) && stem != keep);
        if stale {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Could not remove old weights {}: {}", path.display(), e);
            }
        }
    }
}
