//! Feature assembly: maps a [`ParameterSet`] onto the ordered vectors each
//! model was trained with.

use serde::Serialize;

use crate::model::ModelRole;
use crate::params::{Field, ParameterSet};

/// Rejection model input: all nine parameters.
pub const REJECTION_LAYOUT: [Field; 9] = [
    Field::ContactAngle,
    Field::PoreRadius,
    Field::Mwco,
    Field::RmsRoughness,
    Field::FilmThickness,
    Field::Pressure,
    Field::Temperature,
    Field::Concentration,
    Field::SoluteMw,
];

/// Permeability model input: film thickness and concentration are not used.
pub const PERMEABILITY_LAYOUT: [Field; 7] = [
    Field::ContactAngle,
    Field::PoreRadius,
    Field::Mwco,
    Field::RmsRoughness,
    Field::Pressure,
    Field::Temperature,
    Field::SoluteMw,
];

/// Ordered field list a model expects.
pub fn layout_for(role: ModelRole) -> &'static [Field] {
    match role {
        ModelRole::Rejection => &REJECTION_LAYOUT,
        ModelRole::Permeability => &PERMEABILITY_LAYOUT,
    }
}

/// Field keys of a layout, e.g. `["ca", "prr", ...]`.
pub fn layout_keys(layout: &[Field]) -> Vec<&'static str> {
    layout.iter().map(Field::key).collect()
}

/// Human-readable ordering, e.g. `[ca, prr, mwco, ...]`.
pub fn describe_layout(layout: &[Field]) -> String {
    format!("[{}]", layout_keys(layout).join(", "))
}

/// An ordered input row for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub role: ModelRole,
    #[serde(rename = "order")]
    #[serde(serialize_with = "serialize_layout")]
    pub layout: &'static [Field],
    pub values: Vec<f64>,
}

fn serialize_layout<S: serde::Serializer>(
    layout: &&'static [Field],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(layout.iter().map(Field::key))
}

impl FeatureVector {
    pub fn assemble(role: ModelRole, params: &ParameterSet) -> Self {
        let layout = layout_for(role);
        Self {
            role,
            layout,
            values: layout.iter().map(|f| params.value(*f)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Both vectors derived from one parameter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledFeatures {
    pub rejection: FeatureVector,
    pub permeability: FeatureVector,
}

impl AssembledFeatures {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            rejection: FeatureVector::assemble(ModelRole::Rejection, params),
            permeability: FeatureVector::assemble(ModelRole::Permeability, params),
        }
    }

    pub fn for_role(&self, role: ModelRole) -> &FeatureVector {
        match role {
            ModelRole::Rejection => &self.rejection,
            ModelRole::Permeability => &self.permeability,
        }
    }
}
