use std::io::Cursor;

use tract_onnx::prelude::*;

use super::Regressor;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Regressor exported to ONNX (e.g. via skl2onnx or CatBoost's ONNX export),
/// run with tract. The input is pinned to `f32 [1, n_features]` when the
/// graph is optimized, so a model trained on a different width fails to load
/// instead of mispredicting.
pub struct OnnxRegressor {
    plan: OnnxPlan,
    n_features: usize,
}

impl OnnxRegressor {
    pub fn from_bytes(bytes: &[u8], n_features: usize) -> TractResult<Self> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(bytes))?
            .with_input_fact(0, f32::fact([1, n_features]).into())?
            .into_optimized()?
            .into_runnable()?;
        Ok(Self { plan, n_features })
    }
}

impl Regressor for OnnxRegressor {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_row(&self, row: &[f64]) -> anyhow::Result<f64> {
        let data: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)?.into();
        let outputs = self.plan.run(tvec!(input.into()))?;
        let first = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no outputs"))?;
        let view = first.to_array_view::<f32>()?;
        let value = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("model produced an empty output tensor"))?;
        Ok(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::model::{LoadedModel, ModelRole};
    use crate::params::ParameterSet;
    use crate::tests::test_utils::{onnx_matmul, write_model};

    // Picks p and smw out of the 7-wide permeability row.
    const PERMEABILITY_WEIGHTS: [f32; 7] = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.01];

    #[test]
    fn runs_matmul_graph() {
        let regressor = OnnxRegressor::from_bytes(&onnx_matmul(&PERMEABILITY_WEIGHTS, true), 7).unwrap();
        assert_eq!(regressor.n_features(), Some(7));

        let y = regressor
            .predict_row(&[15.0, 1.0, 1.0, 45.0, 4.0, 500.0, 200.0])
            .unwrap();
        // 4.0 + 0.01 * 200.0
        assert!((y - 6.0).abs() < 1e-4);
    }

    #[test]
    fn onnx_artifact_loads_for_its_role() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "gbm.onnx", onnx_matmul(&PERMEABILITY_WEIGHTS, true));

        let model = LoadedModel::load(ModelRole::Permeability, &path).unwrap();
        assert_eq!(model.info().kind, "onnx");

        let v = FeatureVector::assemble(ModelRole::Permeability, &ParameterSet::default());
        // defaults: p = 1.0, smw = 100.0
        let y = model.predict(&v).unwrap();
        assert!((y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn graph_of_other_width_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "gbm.onnx", onnx_matmul(&[1.0; 9], true));

        let err = LoadedModel::load(ModelRole::Permeability, &path).unwrap_err();
        assert!(err.to_string().contains("Failed to load Permeability model"));
    }

    #[test]
    fn untyped_graph_input_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "gbm.onnx", onnx_matmul(&PERMEABILITY_WEIGHTS, false));

        assert!(LoadedModel::load(ModelRole::Permeability, &path).is_err());
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "cat.onnx", "definitely not protobuf");

        assert!(LoadedModel::load(ModelRole::Rejection, &path).is_err());
    }
}
