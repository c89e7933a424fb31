// Shared fixtures for the unit test tree

use prost::Message;
use std::path::PathBuf;
use tempfile::TempDir;
use tract_onnx::pb;

use crate::model::Regressor;

/// Linear rejection model: 0.1 * ca + 0.001 * smw, other inputs ignored.
pub const REJECTION_JSON: &str = r#"{
    "kind": "linear",
    "intercept": 0.0,
    "coefficients": [0.1, 0, 0, 0, 0, 0, 0, 0, 0.001],
    "feature_names": ["ca", "prr", "mwco", "rms", "ft", "p", "temp", "conc", "smw"]
}"#;

/// Tree permeability model: splits on pressure (column 4 of the 7-wide input).
pub const PERMEABILITY_JSON: &str = r#"{
    "kind": "tree_ensemble",
    "base_score": 2.0,
    "learning_rate": 0.5,
    "feature_names": ["ca", "prr", "mwco", "rms", "p", "temp", "smw"],
    "trees": [
        {"nodes": [
            {"feature": 4, "threshold": 5.0, "left": 1, "right": 2},
            {"leaf": 1.0},
            {"leaf": 3.0}
        ]}
    ]
}"#;

pub fn write_model(dir: &TempDir, name: &str, body: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("fixture should be written");
    path
}

fn float_tensor_type(dims: &[i64]) -> pb::TypeProto {
    pb::TypeProto {
        value: Some(pb::type_proto::Value::TensorType(pb::type_proto::Tensor {
            elem_type: pb::tensor_proto::DataType::Float as i32,
            shape: Some(pb::TensorShapeProto {
                dim: dims
                    .iter()
                    .map(|d| pb::tensor_shape_proto::Dimension {
                        value: Some(pb::tensor_shape_proto::dimension::Value::DimValue(*d)),
                        ..Default::default()
                    })
                    .collect(),
            }),
        })),
        ..Default::default()
    }
}

/// Encoded single-MatMul ONNX graph: `y[1, 1] = x[1, N] * w[N, 1]`.
///
/// With `typed_input` unset the graph input carries no type information,
/// which the ONNX importer cannot handle.
pub fn onnx_matmul(weights: &[f32], typed_input: bool) -> Vec<u8> {
    let n = weights.len() as i64;
    let graph = pb::GraphProto {
        name: "matmul".into(),
        node: vec![pb::NodeProto {
            input: vec!["x".into(), "w".into()],
            output: vec!["y".into()],
            name: "matmul".into(),
            op_type: "MatMul".into(),
            ..Default::default()
        }],
        initializer: vec![pb::TensorProto {
            name: "w".into(),
            dims: vec![n, 1],
            data_type: pb::tensor_proto::DataType::Float as i32,
            float_data: weights.to_vec(),
            ..Default::default()
        }],
        input: vec![pb::ValueInfoProto {
            name: "x".into(),
            r#type: typed_input.then(|| float_tensor_type(&[1, n])),
            ..Default::default()
        }],
        output: vec![pb::ValueInfoProto {
            name: "y".into(),
            r#type: Some(float_tensor_type(&[1, 1])),
            ..Default::default()
        }],
        ..Default::default()
    };

    pb::ModelProto {
        ir_version: 7,
        opset_import: vec![pb::OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        graph: Some(graph),
        ..Default::default()
    }
    .encode_to_vec()
}

/// Backend that always errors, standing in for a corrupt model at inference.
pub struct FailingRegressor;

impl Regressor for FailingRegressor {
    fn kind(&self) -> &'static str {
        "failing"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_row(&self, row: &[f64]) -> anyhow::Result<f64> {
        anyhow::bail!("input of width {} could not be evaluated", row.len())
    }
}
