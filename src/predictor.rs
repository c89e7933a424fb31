//! Runs the available models for one "Start Prediction" action.
//!
//! Each role is predicted independently. A role whose model is not loaded is
//! reported as such; a role whose inference fails carries the error message.
//! Neither outcome prevents the sibling role from being predicted and shown.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::features::AssembledFeatures;
use crate::model::ModelRole;
use crate::model_store::{ModelSlot, ModelStore};
use crate::params::ParameterSet;

/// Result for one role within a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoleOutcome {
    Predicted { value: f64, model: String },
    NotLoaded { message: String },
    Failed { message: String },
}

impl RoleOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            RoleOutcome::Predicted { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub params: ParameterSet,
    pub features: AssembledFeatures,
    pub rejection: RoleOutcome,
    pub permeability: RoleOutcome,
}

impl PredictionReport {
    pub fn outcome(&self, role: ModelRole) -> &RoleOutcome {
        match role {
            ModelRole::Rejection => &self.rejection,
            ModelRole::Permeability => &self.permeability,
        }
    }
}

/// Message shown in place of a result card when a role has no model.
pub fn not_loaded_message(role: ModelRole, slot: &ModelSlot) -> String {
    match role {
        ModelRole::Rejection => "Rejection model not loaded.".to_string(),
        ModelRole::Permeability => {
            format!("Permeability model ({}) not loaded.", slot.file_name())
        }
    }
}

fn predict_role(store: &ModelStore, role: ModelRole, features: &AssembledFeatures) -> RoleOutcome {
    let slot = store.slot(role);
    let Some(model) = slot.model() else {
        debug!("Skipping {} prediction: model not loaded", role);
        return RoleOutcome::NotLoaded {
            message: not_loaded_message(role, slot),
        };
    };

    match model.predict(features.for_role(role)) {
        Ok(value) => RoleOutcome::Predicted {
            value,
            model: model.file_name(),
        },
        Err(e) => {
            error!("{} prediction failed: {}", role, e);
            RoleOutcome::Failed {
                message: format!("Prediction Error: {e}"),
            }
        }
    }
}

/// Assemble both feature vectors and run every loaded model.
pub fn run_prediction(store: &ModelStore, params: &ParameterSet) -> PredictionReport {
    let features = AssembledFeatures::from_params(params);
    let rejection = predict_role(store, ModelRole::Rejection, &features);
    let permeability = predict_role(store, ModelRole::Permeability, &features);

    let report = PredictionReport {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        params: *params,
        features,
        rejection,
        permeability,
    };
    info!(
        "Prediction {}: rejection={:?} permeability={:?}",
        report.id,
        report.rejection.value(),
        report.permeability.value()
    );
    report
}
