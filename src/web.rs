use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::api_errors::ApiError;
use crate::app_state::AppState;
use crate::model_store::{Availability, StoreStatus};
use crate::params::ParameterSet;
use crate::predictor::{run_prediction, PredictionReport};
use crate::render::{render_page, FormValues, PageContext};

/// Build the router serving the form, the JSON API and health checks
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // form
        .route("/", get(index))
        .route("/predict", post(predict_form))
        // JSON API
        .route("/api/predict", post(predict_json))
        .route("/api/models", get(models_status))
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn page(
    st: &AppState,
    values: FormValues<'_>,
    report: Option<&PredictionReport>,
    form_error: Option<&str>,
) -> Html<String> {
    Html(render_page(&PageContext {
        title: &st.ui.title,
        values,
        notices: &st.notices,
        report,
        form_error,
        show_debug: st.ui.show_debug,
    }))
}

async fn index(State(st): State<Arc<AppState>>) -> Html<String> {
    page(&st, FormValues::Params(&ParameterSet::default()), None, None)
}

async fn predict_form(
    State(st): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Html<String> {
    match ParameterSet::from_form(&form) {
        Ok(params) => {
            let report = run_prediction(&st.store, &params);
            page(&st, FormValues::Params(&params), Some(&report), None)
        }
        Err(e) => {
            warn!("Rejected form submission: {}", e);
            let message = format!("Prediction Error: {e}");
            page(&st, FormValues::Raw(&form), None, Some(&message))
        }
    }
}

async fn predict_json(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<ParameterSet>, JsonRejection>,
) -> Result<Json<PredictionReport>, ApiError> {
    let Json(params) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    params.ensure_finite()?;
    Ok(Json(run_prediction(&st.store, &params)))
}

async fn models_status(State(st): State<Arc<AppState>>) -> Json<StoreStatus> {
    Json(st.store.status())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(State(st): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let availability = st.store.availability();
    Json(serde_json::json!({
        "ready": availability != Availability::Unavailable,
        "availability": availability,
    }))
}
