//! Startup-time model loading.
//!
//! Both artifacts are read once, before the listener binds, into an immutable
//! [`ModelStore`] that request handlers share through an `Arc`. Nothing is
//! reloaded afterwards.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ModelPaths;
use crate::errors::{MembraneError, MembraneResult};
use crate::model::{file_name_of, LoadedModel, ModelInfo, ModelRole};

/// Load state of one role.
#[derive(Debug, Clone)]
pub enum ModelSlot {
    Loaded(Arc<LoadedModel>),
    /// No file at the configured path.
    Missing { path: PathBuf },
    /// The file exists but could not be turned into a usable model.
    Broken { path: PathBuf, reason: String },
}

impl ModelSlot {
    /// Resolve one role from disk. A missing file is an explicit marker, never
    /// a stand-in model.
    pub fn load(role: ModelRole, path: &Path) -> Self {
        if !path.exists() {
            return ModelSlot::Missing {
                path: path.to_path_buf(),
            };
        }
        match LoadedModel::load(role, path) {
            Ok(model) => ModelSlot::Loaded(Arc::new(model)),
            Err(e) => ModelSlot::Broken {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        }
    }

    pub fn model(&self) -> Option<&Arc<LoadedModel>> {
        match self {
            ModelSlot::Loaded(m) => Some(m),
            _ => None,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ModelSlot::Loaded(m) => m.path(),
            ModelSlot::Missing { path } | ModelSlot::Broken { path, .. } => path,
        }
    }

    pub fn file_name(&self) -> String {
        file_name_of(self.path())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelSlot::Loaded(_))
    }
}

/// Overall serving mode derived from the two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Full,
    Degraded { unavailable: ModelRole },
    Unavailable,
}

/// A startup notice shown on every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupNotice {
    pub role: ModelRole,
    pub severity: NoticeSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotStatus {
    Loaded(ModelInfo),
    Missing { path: String },
    Broken { path: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub availability: Availability,
    pub rejection: SlotStatus,
    pub permeability: SlotStatus,
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    rejection: ModelSlot,
    permeability: ModelSlot,
}

impl ModelStore {
    pub fn new(rejection: ModelSlot, permeability: ModelSlot) -> Self {
        Self {
            rejection,
            permeability,
        }
    }

    /// Load both roles from the configured paths and log the outcome.
    pub fn load(paths: &ModelPaths) -> Self {
        let store = Self::new(
            ModelSlot::load(ModelRole::Rejection, &paths.rejection),
            ModelSlot::load(ModelRole::Permeability, &paths.permeability),
        );

        for role in ModelRole::ALL {
            match store.slot(role) {
                ModelSlot::Loaded(m) => {
                    info!("{} model loaded from {}", role, m.path().display())
                }
                ModelSlot::Missing { path } => {
                    warn!("{} model not found at {}", role, path.display())
                }
                ModelSlot::Broken { path, reason } => {
                    error!("{} model at {} is unusable: {}", role, path.display(), reason)
                }
            }
        }
        store
    }

    pub fn slot(&self, role: ModelRole) -> &ModelSlot {
        match role {
            ModelRole::Rejection => &self.rejection,
            ModelRole::Permeability => &self.permeability,
        }
    }

    pub fn model(&self, role: ModelRole) -> Option<&Arc<LoadedModel>> {
        self.slot(role).model()
    }

    pub fn availability(&self) -> Availability {
        match (self.rejection.is_loaded(), self.permeability.is_loaded()) {
            (true, true) => Availability::Full,
            (true, false) => Availability::Degraded {
                unavailable: ModelRole::Permeability,
            },
            (false, true) => Availability::Degraded {
                unavailable: ModelRole::Rejection,
            },
            (false, false) => Availability::Unavailable,
        }
    }

    /// Startup gate: refuse to serve when neither model is usable.
    pub fn ensure_servable(&self) -> MembraneResult<()> {
        match self.availability() {
            Availability::Unavailable => Err(MembraneError::NoModelsAvailable),
            _ => Ok(()),
        }
    }

    /// Page banners for every role that did not load.
    pub fn notices(&self) -> Vec<StartupNotice> {
        ModelRole::ALL
            .iter()
            .filter_map(|role| {
                let (severity, message) = match self.slot(*role) {
                    ModelSlot::Loaded(_) => return None,
                    ModelSlot::Missing { path } => {
                        // A missing rejection model is an error; permeability is optional.
                        let (severity, prefix) = match role {
                            ModelRole::Rejection => (NoticeSeverity::Error, "ERROR"),
                            ModelRole::Permeability => (NoticeSeverity::Warning, "WARNING"),
                        };
                        (
                            severity,
                            format!(
                                "{prefix}: '{}' ({} Model) not found! {} prediction will be unavailable.",
                                path.display(),
                                role,
                                role
                            ),
                        )
                    }
                    ModelSlot::Broken { path, reason } => (
                        NoticeSeverity::Error,
                        format!(
                            "ERROR: '{}' ({} Model) could not be loaded: {}. {} prediction will be unavailable.",
                            path.display(),
                            role,
                            reason,
                            role
                        ),
                    ),
                };
                Some(StartupNotice {
                    role: *role,
                    severity,
                    message,
                })
            })
            .collect()
    }

    pub fn status(&self) -> StoreStatus {
        let slot_status = |slot: &ModelSlot| match slot {
            ModelSlot::Loaded(m) => SlotStatus::Loaded(m.info()),
            ModelSlot::Missing { path } => SlotStatus::Missing {
                path: path.display().to_string(),
            },
            ModelSlot::Broken { path, reason } => SlotStatus::Broken {
                path: path.display().to_string(),
                reason: reason.clone(),
            },
        };
        StoreStatus {
            availability: self.availability(),
            rejection: slot_status(&self.rejection),
            permeability: slot_status(&self.permeability),
        }
    }
}
