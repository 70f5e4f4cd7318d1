// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// JSON endpoints live under `/api/v1/`; `/` serves an HTML rendering of the
// cached recommendation and `/analyze/:ticker` an HTML single-ticker page.  Handlers only read from or write to `AppState`; the
// scan itself and its cache policy live there.
//
// CORS is configured permissively; the service is read-only apart from
// triggering a rescan.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::errors::ProviderError;
use crate::render;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/v1/health", get(health))
        .route("/api/v1/recommendation", get(recommendation))
        .route("/api/v1/scan", post(scan_now))
        .route("/api/v1/analyze/:ticker", get(analyze))
        .route("/analyze/:ticker", get(analyze_html))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health())
}

// =============================================================================
// Recommendation (cached)
// =============================================================================

async fn recommendation(State(state): State<Arc<AppState>>) -> Response {
    match state.latest_scan() {
        Some(cached) => {
            let stale = cached.is_stale(state.max_scan_age());
            Json(json!({
                "stale": stale,
                "state_version": state.current_state_version(),
                "report": &*cached.report,
            }))
            .into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "report": null, "message": "No scan has completed yet" })),
        )
            .into_response(),
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let cached = state.latest_scan();
    Html(render::index_page(cached.as_ref().map(|c| &*c.report)))
}

// =============================================================================
// Scan now
// =============================================================================

async fn scan_now(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("manual scan requested");
    let report = state.run_scan().await;
    Json(json!({
        "state_version": state.current_state_version(),
        "report": &*report,
    }))
}

// =============================================================================
// Single-ticker analysis
// =============================================================================

fn valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker.len() <= 12
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

fn error_status(e: &ProviderError) -> StatusCode {
    match e {
        ProviderError::UnknownTicker { .. }
        | ProviderError::EmptyHistory { .. }
        | ProviderError::QuoteUnavailable { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

async fn analyze(State(state): State<Arc<AppState>>, Path(ticker): Path<String>) -> Response {
    let ticker = ticker.trim().to_uppercase();
    if !valid_ticker(&ticker) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid ticker '{ticker}'") })),
        )
            .into_response();
    }

    match state.analyze_ticker(&ticker).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => {
            let status = error_status(&e);
            warn!(ticker = %ticker, error = %e, status = status.as_u16(), "analysis failed");
            (status, Json(json!({ "ticker": ticker, "error": e.to_string() }))).into_response()
        }
    }
}

async fn analyze_html(State(state): State<Arc<AppState>>, Path(ticker): Path<String>) -> Response {
    let ticker = ticker.trim().to_uppercase();
    if !valid_ticker(&ticker) {
        let message = format!("Invalid ticker '{ticker}'.");
        return (StatusCode::BAD_REQUEST, Html(render::error_page(&message))).into_response();
    }

    match state.analyze_ticker(&ticker).await {
        Ok(analysis) => Html(render::analysis_page(&analysis)).into_response(),
        Err(e) => {
            let status = error_status(&e);
            warn!(ticker = %ticker, error = %e, status = status.as_u16(), "analysis page failed");
            let message = format!("Could not analyse {ticker}: {e}");
            (status, Html(render::error_page(&message))).into_response()
        }
    }
}
