// tests/web.rs
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for .oneshot()

use membrane_predict::{
    app_state::AppState,
    config::{ModelPaths, UiConfig},
    model_store::ModelSlot,
    web::build_router,
    LoadedModel, ModelRole, ModelStore, Regressor,
};

const REJECTION_JSON: &str = r#"{
    "kind": "linear",
    "intercept": 0.25,
    "coefficients": [0.01, 0, 0, 0, 0, 0, 0, 0, 0],
    "feature_names": ["ca", "prr", "mwco", "rms", "ft", "p", "temp", "conc", "smw"]
}"#;

const PERMEABILITY_JSON: &str = r#"{
    "kind": "linear",
    "intercept": 1.0,
    "coefficients": [0, 0, 0, 0, 2.0, 0, 0],
    "feature_names": ["ca", "prr", "mwco", "rms", "p", "temp", "smw"]
}"#;

struct ExplodingRegressor;

impl Regressor for ExplodingRegressor {
    fn kind(&self) -> &'static str {
        "exploding"
    }

    fn n_features(&self) -> Option<usize> {
        Some(7)
    }

    fn predict_row(&self, _row: &[f64]) -> anyhow::Result<f64> {
        anyhow::bail!("tensor shape mismatch")
    }
}

fn write_model(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("fixture should be written");
    path
}

fn app_with(store: ModelStore) -> Router {
    build_router(Arc::new(AppState::new(store, UiConfig::default())))
}

fn full_app(dir: &TempDir) -> Router {
    app_with(ModelStore::load(&ModelPaths {
        rejection: write_model(dir, "cat.json", REJECTION_JSON),
        permeability: write_model(dir, "gbm.json", PERMEABILITY_JSON),
    }))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .uri("/predict")
        .method("POST")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_renders_form_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = full_app(&dir).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Membrane Performance Prediction"));
    assert!(html.contains(r#"name="ca" value="15.00""#));
    assert!(html.contains("Start Prediction"));
    assert!(!html.contains("Prediction Results"));
}

#[tokio::test]
async fn form_submit_renders_both_cards_and_debug_panel() {
    let dir = tempfile::tempdir().unwrap();

    let response = full_app(&dir)
        .oneshot(form_request("ca=15&prr=1&mwco=1&rms=45&ft=1&p=1&temp=500&smw=100&conc=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    // 0.25 + 0.01 * 15
    assert!(html.contains("0.4000"));
    // 1.0 + 2.0 * p
    assert!(html.contains("3.0000"));
    assert!(html.contains("Model: cat.json"));
    assert!(html.contains("Model: gbm.json"));
    assert!(html.contains("Show Debug Input Data"));
    assert!(html.contains("[15.0, 1.0, 1.0, 45.0, 1.0, 1.0, 500.0, 1.0, 100.0]"));
    assert!(html.contains("[15.0, 1.0, 1.0, 45.0, 1.0, 500.0, 100.0]"));
    assert!(html.contains("Order: [ca, prr, mwco, rms, ft, p, temp, conc, smw]"));
    assert!(html.contains("Order: [ca, prr, mwco, rms, p, temp, smw]"));
}

#[tokio::test]
async fn form_echoes_submitted_values() {
    let dir = tempfile::tempdir().unwrap();

    let response = full_app(&dir).oneshot(form_request("p=4")).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains(r#"name="p" value="4.00""#));
    assert!(html.contains("9.0000"));
}

#[tokio::test]
async fn non_numeric_input_is_an_inline_error() {
    let dir = tempfile::tempdir().unwrap();

    let response = full_app(&dir).oneshot(form_request("temp=hot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Prediction Error:"));
    assert!(html.contains("Temperature"));
    assert!(!html.contains("Prediction Results"));
}

#[tokio::test]
async fn rejected_submission_keeps_what_was_typed() {
    let dir = tempfile::tempdir().unwrap();

    let response = full_app(&dir)
        .oneshot(form_request("ca=33.3&prr=0.45&temp=hot"))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Prediction Error:"));
    assert!(html.contains(r#"name="ca" value="33.3""#));
    assert!(html.contains(r#"name="prr" value="0.45""#));
    assert!(html.contains(r#"name="temp" value="hot""#));
    assert!(html.contains(r#"name="smw" value="100.0""#));
}

#[tokio::test]
async fn fractional_values_round_trip_through_the_form() {
    let dir = tempfile::tempdir().unwrap();

    let response = full_app(&dir).oneshot(form_request("prr=0.45")).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains(r#"name="prr" value="0.45" step="any""#));
    assert!(!html.contains(r#"step="1""#));
    assert!(html.contains("Prediction Results"));
}

#[tokio::test]
async fn degraded_mode_shows_warning_and_not_loaded_message() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gbm.onnx");
    let app = app_with(ModelStore::load(&ModelPaths {
        rejection: write_model(&dir, "cat.json", REJECTION_JSON),
        permeability: missing.clone(),
    }));

    let response = app.oneshot(form_request("ca=15")).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains("not found!"));
    assert!(html.contains(r#"class="alert warning""#));
    assert!(html.contains("0.4000"));
    assert!(html.contains("Permeability model (gbm.onnx) not loaded."));
}

#[tokio::test]
async fn permeability_failure_keeps_rejection_card() {
    let dir = tempfile::tempdir().unwrap();
    let rejection = LoadedModel::load(
        ModelRole::Rejection,
        &write_model(&dir, "cat.json", REJECTION_JSON),
    )
    .unwrap();
    let permeability =
        LoadedModel::new(ModelRole::Permeability, "models/gbm.onnx", Box::new(ExplodingRegressor)).unwrap();
    let app = app_with(ModelStore::new(
        ModelSlot::Loaded(Arc::new(rejection)),
        ModelSlot::Loaded(Arc::new(permeability)),
    ));

    let response = app.oneshot(form_request("ca=15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Rejection Prediction"));
    assert!(html.contains("0.4000"));
    assert!(html.contains("Prediction Error:"));
    assert!(html.contains("tensor shape mismatch"));
    assert!(!html.contains("Permeability Prediction"));
}

#[tokio::test]
async fn api_predict_returns_report() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder()
        .uri("/api/predict")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"p": 2.0}"#))
        .unwrap();

    let response = full_app(&dir).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["rejection"]["status"], "predicted");
    assert_eq!(json["permeability"]["value"], 5.0);
    assert_eq!(json["params"]["ca"], 15.0);
    assert_eq!(
        json["features"]["permeability"]["values"].as_array().unwrap().len(),
        7
    );
}

#[tokio::test]
async fn api_predict_rejects_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder()
        .uri("/api/predict")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"ca": "wide"}"#))
        .unwrap();

    let response = full_app(&dir).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn models_and_readiness_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(ModelStore::load(&ModelPaths {
        rejection: dir.path().join("cat.onnx"),
        permeability: write_model(&dir, "gbm.json", PERMEABILITY_JSON),
    }));

    let req = Request::builder().uri("/api/models").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["rejection"]["status"], "missing");
    assert_eq!(json["permeability"]["status"], "loaded");
    assert_eq!(json["permeability"]["order"][4], "p");

    let req = Request::builder().uri("/readyz").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["ready"], true);

    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
