//! HTTP handlers for the web UI

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::state::AppState;
use crate::report::{render_html, ReportContext};
use crate::scoring::{ReportView, ScoreState};

/// Query parameters selecting a single score
#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    pub test: String,
    #[serde(default)]
    pub tag: String,
}

/// Response for the score list
#[derive(Debug, Serialize)]
pub struct ScoreListResponse {
    pub loaded_at: String,
    pub total: usize,
    pub better: usize,
    pub worse: usize,
    pub report: ReportView,
}

/// Full state of a single score
#[derive(Debug, Serialize)]
pub struct ScoreDetail {
    pub test: String,
    pub tag: String,
    pub current: Option<f64>,
    pub last: Option<f64>,
    pub best: Option<f64>,
    pub history: Vec<Option<f64>>,
    pub history_length: usize,
    pub less_is_better: bool,
    pub cutoff: Option<f64>,
    pub state: ScoreState,
}

// ============================================================================
// Page Handlers (HTML)
// ============================================================================

/// Score sheet page
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    state.reload().await;
    let loaded = state.snapshot().await;
    let context = ReportContext {
        session_id: None,
        generated_at: loaded.loaded_at,
    };

    match render_html(&loaded.sheet.create_report_view(), &context) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::warn!("Failed to render score page: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================================
// API Handlers (JSON)
// ============================================================================

/// List all scores as a report view
pub async fn api_list_scores(State(state): State<Arc<AppState>>) -> Json<ScoreListResponse> {
    state.reload().await;
    let loaded = state.snapshot().await;
    let report = loaded.sheet.create_report_view();

    let better = report.states.iter().filter(|s| **s == ScoreState::Better).count();
    let worse = report.states.iter().filter(|s| **s == ScoreState::Worse).count();

    Json(ScoreListResponse {
        loaded_at: loaded.loaded_at.to_rfc3339(),
        total: report.rows.len(),
        better,
        worse,
        report,
    })
}

/// Get a specific score by test and tag
pub async fn api_get_score(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoreQuery>,
) -> Result<Json<ScoreDetail>, StatusCode> {
    let loaded = state.snapshot().await;
    let result = loaded
        .sheet
        .get(&query.test, &query.tag)
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ScoreDetail {
        current: result.current(),
        last: result.last(),
        best: result.best(),
        history: result.history().collect(),
        history_length: result.history_length(),
        less_is_better: result.evaluator().less_is_better(),
        cutoff: result.evaluator().cutoff(),
        state: result.get_state(),
        test: query.test,
        tag: query.tag,
    }))
}

/// Refresh the sheet from disk
pub async fn api_refresh(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let count = state.reload().await;
    Json(serde_json::json!({
        "status": "ok",
        "scores_loaded": count
    }))
}

/// Health check endpoint
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "score-ledger-ui"
    }))
}
