//! Pretrained regression models and the contract binding each one to its
//! feature layout.
//!
//! A [`LoadedModel`] is immutable once built. It records which role it serves,
//! where it was loaded from, and the exact field order it accepts. Every call
//! to [`LoadedModel::predict`] checks the incoming vector against that order
//! before the backend sees it.

mod linear;
mod onnx;
mod tree;

pub use linear::LinearRegressor;
pub use onnx::OnnxRegressor;
pub use tree::{TreeEnsemble, TreeNode, RegressionTree};

use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::errors::{MembraneError, MembraneResult};
use crate::features::{describe_layout, layout_for, layout_keys, FeatureVector};
use crate::params::Field;

/// The two prediction targets. Closed set: there is no third model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    Rejection,
    Permeability,
}

impl ModelRole {
    pub const ALL: [ModelRole; 2] = [ModelRole::Rejection, ModelRole::Permeability];

    pub fn title(&self) -> &'static str {
        match self {
            ModelRole::Rejection => "Rejection",
            ModelRole::Permeability => "Permeability",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Inference backend for a single-output regressor.
pub trait Regressor: Send + Sync {
    /// Short backend name shown in model status.
    fn kind(&self) -> &'static str;

    /// Number of input columns, if the artifact declares it.
    fn n_features(&self) -> Option<usize>;

    /// Feature names, if the artifact records the training column order.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict one observation.
    fn predict_row(&self, row: &[f64]) -> anyhow::Result<f64>;
}

/// Status summary of a loaded model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub role: ModelRole,
    pub path: String,
    pub file_name: String,
    pub kind: &'static str,
    pub n_features: usize,
    pub order: Vec<&'static str>,
    pub sha256: String,
}

pub struct LoadedModel {
    role: ModelRole,
    path: PathBuf,
    fingerprint: String,
    layout: &'static [Field],
    regressor: Box<dyn Regressor>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("role", &self.role)
            .field("path", &self.path)
            .field("kind", &self.regressor.kind())
            .finish()
    }
}

impl LoadedModel {
    /// Bind a backend to a role, verifying its declared arity and feature
    /// names against the role's layout.
    pub fn new(
        role: ModelRole,
        path: impl Into<PathBuf>,
        regressor: Box<dyn Regressor>,
    ) -> MembraneResult<Self> {
        let path = path.into();
        let layout = layout_for(role);
        let path_str = path.display().to_string();

        if let Some(n) = regressor.n_features() {
            if n != layout.len() {
                return Err(MembraneError::model_load(
                    role,
                    path_str,
                    format!(
                        "model expects {n} features but {role} input has {} {}",
                        layout.len(),
                        describe_layout(layout)
                    ),
                ));
            }
        }

        if let Some(names) = regressor.feature_names() {
            let expected = layout_keys(layout);
            if names.len() != expected.len() || names.iter().zip(&expected).any(|(a, b)| a.as_str() != *b) {
                return Err(MembraneError::model_load(
                    role,
                    path_str,
                    format!(
                        "declared feature order [{}] does not match {}",
                        names.join(", "),
                        describe_layout(layout)
                    ),
                ));
            }
        }

        Ok(Self {
            role,
            path,
            fingerprint: String::new(),
            layout,
            regressor,
        })
    }

    /// Deserialize a model artifact from disk. The backend is chosen by file
    /// extension: `.onnx` or `.json`.
    pub fn load(role: ModelRole, path: &Path) -> MembraneResult<Self> {
        let path_str = path.display().to_string();
        let bytes = std::fs::read(path)
            .map_err(|e| MembraneError::model_load(role, &path_str, e.to_string()))?;
        let n_features = layout_for(role).len();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let regressor = guarded_build(role, &path_str, || build_backend(&ext, &bytes, n_features))?;

        let mut model = Self::new(role, path, regressor)?;
        model.fingerprint = b64.encode(Sha256::digest(&bytes));
        log::debug!(
            "Loaded {} model from {} ({} backend)",
            role,
            path_str,
            model.regressor.kind()
        );
        Ok(model)
    }

    pub fn role(&self) -> ModelRole {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    pub fn layout(&self) -> &'static [Field] {
        self.layout
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            role: self.role,
            path: self.path.display().to_string(),
            file_name: self.file_name(),
            kind: self.regressor.kind(),
            n_features: self.layout.len(),
            order: layout_keys(self.layout),
            sha256: self.fingerprint.clone(),
        }
    }

    /// Run inference on a 1 × N input.
    ///
    /// The vector must belong to this model's role and follow its layout
    /// exactly. Backend errors, panics and non-finite outputs all surface as
    /// [`MembraneError::Inference`].
    pub fn predict(&self, features: &FeatureVector) -> MembraneResult<f64> {
        if features.role != self.role || features.layout != self.layout {
            return Err(MembraneError::feature_mismatch(
                self.role,
                describe_layout(self.layout),
                describe_layout(features.layout),
            ));
        }
        if features.len() != self.layout.len() {
            return Err(MembraneError::feature_mismatch(
                self.role,
                format!("{} values", self.layout.len()),
                format!("{} values", features.len()),
            ));
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.regressor.predict_row(&features.values)
        }));

        let value = match outcome {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => return Err(MembraneError::inference(self.role, format!("{e:#}"))),
            Err(_) => {
                return Err(MembraneError::inference(
                    self.role,
                    "inference backend panicked",
                ))
            }
        };

        if !value.is_finite() {
            return Err(MembraneError::inference(
                self.role,
                format!("model returned non-finite value {value}"),
            ));
        }
        Ok(value)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run a backend constructor, turning both errors and panics into load errors.
fn guarded_build<F>(role: ModelRole, path: &str, build: F) -> MembraneResult<Box<dyn Regressor>>
where
    F: FnOnce() -> anyhow::Result<Box<dyn Regressor>>,
{
    match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(regressor)) => Ok(regressor),
        Ok(Err(e)) => Err(MembraneError::model_load(role, path, format!("{e:#}"))),
        Err(_) => Err(MembraneError::model_load(role, path, "model loader panicked")),
    }
}

fn build_backend(ext: &str, bytes: &[u8], n_features: usize) -> anyhow::Result<Box<dyn Regressor>> {
    match ext {
        "onnx" => Ok(Box::new(OnnxRegressor::from_bytes(bytes, n_features)?)),
        "json" => parse_json_artifact(bytes),
        other => anyhow::bail!("unsupported model format '.{other}' (expected .onnx or .json)"),
    }
}

/// Native JSON model artifact, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonArtifact {
    Linear(LinearRegressor),
    TreeEnsemble(TreeEnsemble),
}

fn parse_json_artifact(bytes: &[u8]) -> anyhow::Result<Box<dyn Regressor>> {
    let artifact: JsonArtifact = serde_json::from_slice(bytes)?;
    Ok(match artifact {
        JsonArtifact::Linear(m) => {
            m.validate()?;
            Box::new(m)
        }
        JsonArtifact::TreeEnsemble(m) => {
            m.validate()?;
            Box::new(m)
        }
    })
}
