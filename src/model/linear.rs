use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

use super::Regressor;

/// Linear regression: `intercept + sum(coef_i * x_i)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearRegressor {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
            feature_names: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.coefficients.is_empty(), "linear model has no coefficients");
        if let Some(names) = &self.feature_names {
            ensure!(
                names.len() == self.coefficients.len(),
                "{} feature names for {} coefficients",
                names.len(),
                self.coefficients.len()
            );
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_row(&self, row: &[f64]) -> anyhow::Result<f64> {
        if row.len() != self.coefficients.len() {
            bail!(
                "expected {} features, got {}",
                self.coefficients.len(),
                row.len()
            );
        }

        Ok(self.intercept
            + row
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>())
    }
}
