//! Library root for the `membrane_predict` crate
//! Predicts membrane rejection and permeability from nine input parameters.

// Core error handling
pub mod api_errors;
pub mod errors;

// Inputs and feature assembly
pub mod features;
pub mod params;

// Models
pub mod model;
pub mod model_store;
pub mod predictor;

// Configuration & CLI
pub mod cli;
pub mod config;

// Web server interface
pub mod app_state;
pub mod render;
pub mod web;

#[cfg(test)]
mod tests {
    pub mod config;
    pub mod model_store;
    pub mod predictor;
    pub mod test_utils;
}

pub use features::{AssembledFeatures, FeatureVector};
pub use model::{LoadedModel, ModelRole, Regressor};
pub use model_store::ModelStore;
pub use params::ParameterSet;
pub use predictor::{run_prediction, PredictionReport, RoleOutcome};
