// src/api.rs
//! Operations surface: health, one-off classification, config inspect/reload.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::path::PathBuf;
use tower_http::cors::CorsLayer;

use crate::config::{FilterConfigHandle, FilterConfiguration};
use crate::gate::{FilterDecision, FilterGate};
use crate::ingest::types::ArticleCandidate;

#[derive(Clone)]
pub struct AppState {
    pub gate: FilterGate,
    pub config: FilterConfigHandle,
    /// File the admin reload reads. `None` when running on defaults.
    pub config_path: Option<PathBuf>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/classify", post(classify))
        .route("/debug/filter-config", get(debug_filter_config))
        .route("/admin/reload-filter-config", post(admin_reload_filter_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn classify(
    State(state): State<AppState>,
    Json(candidate): Json<ArticleCandidate>,
) -> Json<FilterDecision> {
    let cfg = state.config.snapshot();
    Json(state.gate.evaluate(&candidate, &cfg))
}

async fn debug_filter_config(State(state): State<AppState>) -> Json<FilterConfiguration> {
    Json(state.config.snapshot().as_ref().clone())
}

async fn admin_reload_filter_config(
    State(state): State<AppState>,
) -> Result<Json<FilterConfiguration>, (StatusCode, String)> {
    let Some(path) = state.config_path.as_ref() else {
        return Err((
            StatusCode::CONFLICT,
            "no filter config file in use; running on defaults".to_string(),
        ));
    };
    match state.config.reload_from(path) {
        Ok(cfg) => Ok(Json(cfg.as_ref().clone())),
        Err(e) => {
            tracing::warn!(target: "config", error = ?e, "admin reload failed");
            Err((StatusCode::UNPROCESSABLE_ENTITY, format!("reload failed: {e:#}")))
        }
    }
}
