//! Input parameters collected by the form.
//!
//! Nine scalar fields in two groups. Each field carries its label, default
//! and display precision so the form, the CLI and the JSON API all agree on
//! the same defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{MembraneError, MembraneResult};

/// One of the nine user-supplied parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ContactAngle,
    PoreRadius,
    Mwco,
    RmsRoughness,
    FilmThickness,
    Pressure,
    Temperature,
    SoluteMw,
    Concentration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    Membrane,
    Operating,
}

impl FieldGroup {
    pub fn title(&self) -> &'static str {
        match self {
            FieldGroup::Membrane => "Membrane Parameters",
            FieldGroup::Operating => "Operating Conditions",
        }
    }
}

/// Display and default metadata for a form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub label: &'static str,
    pub group: FieldGroup,
    pub default: f64,
    pub precision: usize,
    pub help: Option<&'static str>,
}

const REJECTION_ONLY: Option<&str> = Some("Used for Rejection only");

/// Form fields in display order.
pub static FIELD_SPECS: [FieldSpec; 9] = [
    FieldSpec {
        field: Field::ContactAngle,
        label: "Contact angle (°)",
        group: FieldGroup::Membrane,
        default: 15.0,
        precision: 2,
        help: None,
    },
    FieldSpec {
        field: Field::PoreRadius,
        label: "Pore radius rp (nm)",
        group: FieldGroup::Membrane,
        default: 1.0,
        precision: 2,
        help: None,
    },
    FieldSpec {
        field: Field::Mwco,
        label: "MWCO (Da)",
        group: FieldGroup::Membrane,
        default: 1.0,
        precision: 2,
        help: None,
    },
    FieldSpec {
        field: Field::RmsRoughness,
        label: "RMS roughness (nm)",
        group: FieldGroup::Membrane,
        default: 45.0,
        precision: 2,
        help: None,
    },
    FieldSpec {
        field: Field::FilmThickness,
        label: "Film thickness (nm)",
        group: FieldGroup::Membrane,
        default: 1.0,
        precision: 3,
        help: REJECTION_ONLY,
    },
    FieldSpec {
        field: Field::Pressure,
        label: "Pressure (bar)",
        group: FieldGroup::Operating,
        default: 1.0,
        precision: 2,
        help: None,
    },
    FieldSpec {
        field: Field::Temperature,
        label: "Temperature (°C)",
        group: FieldGroup::Operating,
        default: 500.0,
        precision: 1,
        help: None,
    },
    FieldSpec {
        field: Field::SoluteMw,
        label: "Solute MW (g/mol)",
        group: FieldGroup::Operating,
        default: 100.0,
        precision: 1,
        help: None,
    },
    FieldSpec {
        field: Field::Concentration,
        label: "Concentration (mg/L)",
        group: FieldGroup::Operating,
        default: 1.0,
        precision: 3,
        help: REJECTION_ONLY,
    },
];

impl Field {
    /// Short key used in form submissions, JSON bodies and debug orderings.
    pub fn key(&self) -> &'static str {
        match self {
            Field::ContactAngle => "ca",
            Field::PoreRadius => "prr",
            Field::Mwco => "mwco",
            Field::RmsRoughness => "rms",
            Field::FilmThickness => "ft",
            Field::Pressure => "p",
            Field::Temperature => "temp",
            Field::SoluteMw => "smw",
            Field::Concentration => "conc",
        }
    }

    pub fn spec(&self) -> &'static FieldSpec {
        let idx = match self {
            Field::ContactAngle => 0,
            Field::PoreRadius => 1,
            Field::Mwco => 2,
            Field::RmsRoughness => 3,
            Field::FilmThickness => 4,
            Field::Pressure => 5,
            Field::Temperature => 6,
            Field::SoluteMw => 7,
            Field::Concentration => 8,
        };
        &FIELD_SPECS[idx]
    }

    /// Format a value with this field's display precision.
    pub fn format_value(&self, value: f64) -> String {
        format!("{:.*}", self.spec().precision, value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The nine values entered by the user. Missing keys take the form defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub ca: f64,
    pub prr: f64,
    pub mwco: f64,
    pub rms: f64,
    pub ft: f64,
    pub p: f64,
    pub temp: f64,
    pub smw: f64,
    pub conc: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut params = Self {
            ca: 0.0,
            prr: 0.0,
            mwco: 0.0,
            rms: 0.0,
            ft: 0.0,
            p: 0.0,
            temp: 0.0,
            smw: 0.0,
            conc: 0.0,
        };
        for spec in FIELD_SPECS.iter() {
            params.set(spec.field, spec.default);
        }
        params
    }
}

impl ParameterSet {
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::ContactAngle => self.ca,
            Field::PoreRadius => self.prr,
            Field::Mwco => self.mwco,
            Field::RmsRoughness => self.rms,
            Field::FilmThickness => self.ft,
            Field::Pressure => self.p,
            Field::Temperature => self.temp,
            Field::SoluteMw => self.smw,
            Field::Concentration => self.conc,
        }
    }

    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::ContactAngle => &mut self.ca,
            Field::PoreRadius => &mut self.prr,
            Field::Mwco => &mut self.mwco,
            Field::RmsRoughness => &mut self.rms,
            Field::FilmThickness => &mut self.ft,
            Field::Pressure => &mut self.p,
            Field::Temperature => &mut self.temp,
            Field::SoluteMw => &mut self.smw,
            Field::Concentration => &mut self.conc,
        };
        *slot = value;
    }

    /// Build a parameter set from raw form values.
    ///
    /// Absent or blank fields keep their defaults. A present value must parse
    /// as a finite number; the first offending field is reported.
    pub fn from_form(form: &HashMap<String, String>) -> MembraneResult<Self> {
        let mut params = Self::default();
        for spec in FIELD_SPECS.iter() {
            let key = spec.field.key();
            let Some(raw) = form.get(key) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw
                .parse()
                .map_err(|_| MembraneError::validation(spec.label, format!("'{raw}' is not a number")))?;
            if !value.is_finite() {
                return Err(MembraneError::validation(spec.label, "value must be finite"));
            }
            params.set(spec.field, value);
        }
        Ok(params)
    }

    /// Reject NaN and infinite values arriving through the JSON API.
    pub fn ensure_finite(&self) -> MembraneResult<()> {
        match FIELD_SPECS.iter().find(|s| !self.value(s.field).is_finite()) {
            Some(spec) => Err(MembraneError::validation(spec.label, "value must be finite")),
            None => Ok(()),
        }
    }
}
