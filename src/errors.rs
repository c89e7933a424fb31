//! Error handling for the membrane prediction service
//!
//! Library code returns [`MembraneError`]; only the binary edge reaches for
//! `anyhow`.

use crate::model::ModelRole;
use thiserror::Error;

/// Main error type for the prediction service
#[derive(Error, Debug)]
pub enum MembraneError {
    #[error("Failed to load {role} model from '{path}': {message}")]
    ModelLoad {
        role: ModelRole,
        path: String,
        message: String,
    },

    #[error("Feature mismatch for {role} model: expected {expected}, got {actual}")]
    FeatureMismatch {
        role: ModelRole,
        expected: String,
        actual: String,
    },

    #[error("{role} inference failed: {message}")]
    Inference { role: ModelRole, message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("No prediction model could be loaded")]
    NoModelsAvailable,
}

pub type MembraneResult<T> = Result<T, MembraneError>;

impl MembraneError {
    /// Create a model load error for one role
    pub fn model_load(
        role: ModelRole,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ModelLoad {
            role,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn feature_mismatch(
        role: ModelRole,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::FeatureMismatch {
            role,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an inference error for one role
    pub fn inference(role: ModelRole, message: impl Into<String>) -> Self {
        Self::Inference {
            role,
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
