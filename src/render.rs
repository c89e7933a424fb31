//! HTML rendering of the prediction page.
//!
//! Pure functions of their inputs: rendering never touches the model store.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::features::{describe_layout, FeatureVector};
use crate::model::ModelRole;
use crate::model_store::{NoticeSeverity, StartupNotice};
use crate::params::{FieldGroup, FieldSpec, ParameterSet, FIELD_SPECS};
use crate::predictor::{PredictionReport, RoleOutcome};

const STYLE: &str = r#"
body { font-family: sans-serif; background-color: #f4f6f9; margin: 0; padding: 24px; }
h1 { color: #1e3a8a; text-align: center; margin-bottom: 20px; }
h4.subtitle { text-align: center; color: gray; }
.columns { display: flex; gap: 32px; }
.columns > div { flex: 1; }
label { display: block; font-size: 15px; font-weight: 600; color: #374151; margin-top: 12px; }
input[type=number] { width: 100%; padding: 6px; box-sizing: border-box; }
.help { font-size: 12px; color: gray; }
button { width: 100%; background-color: #2563eb; color: white; font-size: 18px; padding: 12px; border-radius: 8px; border: none; margin-top: 24px; }
button:hover { background-color: #1d4ed8; }
.result-card { background-color: #ffffff; padding: 20px; border-radius: 10px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); text-align: center; }
.alert { padding: 12px; border-radius: 8px; margin: 8px 0; }
.alert.error { background-color: #fee2e2; color: #991b1b; }
.alert.warning { background-color: #fef3c7; color: #92400e; }
details { background-color: white; border-radius: 10px; padding: 12px; margin-top: 20px; }
"#;

/// What the form inputs are filled with.
#[derive(Debug, Clone, Copy)]
pub enum FormValues<'a> {
    Params(&'a ParameterSet),
    /// Raw submission, echoed back after a validation error.
    Raw(&'a HashMap<String, String>),
}

impl FormValues<'_> {
    fn display(&self, spec: &FieldSpec) -> String {
        match self {
            FormValues::Params(params) => spec.field.format_value(params.value(spec.field)),
            FormValues::Raw(form) => match form.get(spec.field.key()).map(|v| v.trim()) {
                Some(raw) if !raw.is_empty() => raw.to_string(),
                _ => spec.field.format_value(spec.default),
            },
        }
    }
}

pub struct PageContext<'a> {
    pub title: &'a str,
    pub values: FormValues<'a>,
    pub notices: &'a [StartupNotice],
    pub report: Option<&'a PredictionReport>,
    pub form_error: Option<&'a str>,
    pub show_debug: bool,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn alert(out: &mut String, class: &str, message: &str) {
    let _ = write!(out, r#"<div class="alert {class}">{}</div>"#, escape_html(message));
}

// `step="any"`: arrows still move by 1, but fractional values stay valid.
fn render_field(out: &mut String, spec: &FieldSpec, values: FormValues<'_>) {
    let key = spec.field.key();
    let value = escape_html(&values.display(spec));
    let title = spec.help.map(|h| format!(r#" title="{}""#, escape_html(h))).unwrap_or_default();
    let _ = write!(
        out,
        r#"<label for="{key}"{title}>{label}</label><input type="number" id="{key}" name="{key}" value="{value}" step="any">"#,
        label = escape_html(spec.label),
    );
    if let Some(help) = spec.help {
        let _ = write!(out, r#"<div class="help">{}</div>"#, escape_html(help));
    }
}

fn render_group(out: &mut String, group: FieldGroup, values: FormValues<'_>) {
    let _ = write!(out, "<div><h4>{}</h4>", group.title());
    for spec in FIELD_SPECS.iter().filter(|s| s.group == group) {
        render_field(out, spec, values);
    }
    out.push_str("</div>");
}

/// Result card or error message for one role.
pub fn render_outcome(role: ModelRole, outcome: &RoleOutcome) -> String {
    let mut out = String::new();
    match outcome {
        RoleOutcome::Predicted { value, model } => {
            let color = match role {
                ModelRole::Rejection => "#2563eb",
                ModelRole::Permeability => "#059669",
            };
            let _ = write!(
                out,
                r#"<div class="result-card"><h3 style="color: #4B5563;">{role} Prediction</h3><h1 style="color: {color};">{value:.4}</h1><p style="color: gray;">Model: {}</p></div>"#,
                escape_html(model)
            );
        }
        RoleOutcome::NotLoaded { message } | RoleOutcome::Failed { message } => {
            alert(&mut out, "error", message);
        }
    }
    out
}

fn render_vector(out: &mut String, heading: &str, vector: &FeatureVector) {
    let _ = write!(
        out,
        "<p><strong>{heading}</strong></p><pre><code>{:?}</code></pre><p class=\"help\">Order: {}</p>",
        vector.values,
        describe_layout(vector.layout)
    );
}

/// Collapsible panel with both raw vectors and their orderings.
pub fn render_debug(report: &PredictionReport) -> String {
    let mut out = String::from("<details><summary>Show Debug Input Data</summary>");
    render_vector(&mut out, "Rejection Input (9 features):", &report.features.rejection);
    render_vector(
        &mut out,
        "Permeability Input (7 features - No ft/conc):",
        &report.features.permeability,
    );
    out.push_str("</details>");
    out
}

fn render_results(out: &mut String, report: &PredictionReport, show_debug: bool) {
    out.push_str(r#"<h3>Prediction Results</h3><div class="columns">"#);
    for role in ModelRole::ALL {
        let _ = write!(out, "<div>{}</div>", render_outcome(role, report.outcome(role)));
    }
    out.push_str("</div>");
    if show_debug {
        out.push_str(&render_debug(report));
    }
}

pub fn render_page(ctx: &PageContext<'_>) -> String {
    let title = escape_html(ctx.title);
    let mut out = String::with_capacity(8 * 1024);
    let _ = write!(
        out,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>{title}</title><style>{STYLE}</style></head><body>"#
    );
    let _ = write!(
        out,
        r#"<h1>{title}</h1><h4 class="subtitle">Prediction of Rejection &amp; Permeability</h4>"#
    );

    for notice in ctx.notices {
        let class = match notice.severity {
            NoticeSeverity::Warning => "warning",
            NoticeSeverity::Error => "error",
        };
        alert(&mut out, class, &notice.message);
    }

    out.push_str(r#"<h3>Please enter membrane parameter indicators</h3><form method="post" action="/predict"><div class="columns">"#);
    render_group(&mut out, FieldGroup::Membrane, ctx.values);
    render_group(&mut out, FieldGroup::Operating, ctx.values);
    out.push_str(r#"</div><hr><button type="submit">Start Prediction</button></form>"#);

    if let Some(err) = ctx.form_error {
        alert(&mut out, "error", err);
    }
    if let Some(report) = ctx.report {
        render_results(&mut out, report, ctx.show_debug);
    }

    out.push_str("</body></html>");
    out
}
