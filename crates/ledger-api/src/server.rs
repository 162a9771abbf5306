//! Axum server and routes.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_ingest::{FeedPublisher, IngestCounters};
use ledger_query::AggregationEngine;
use ledger_types::{AnalyticsSummary, EventRecord, LedgerPhase};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub engine: Arc<AggregationEngine>,
    pub publisher: FeedPublisher,
    pub ingest: Arc<IngestCounters>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analytics/summary", get(handle_summary))
        .route("/analytics/events", get(handle_recent))
        .route("/analytics/events/subject/:subject_id", get(handle_by_subject))
        // path used by the existing dashboard
        .route("/analytics/events/patient/:subject_id", get(handle_by_subject))
        .route("/analytics/events/type/:event_type", get(handle_by_type))
        .route("/analytics/ingest", post(handle_ingest))
        .route("/analytics/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_summary(State(state): State<Arc<AppState>>) -> Json<AnalyticsSummary> {
    Json(state.engine.summary())
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

async fn handle_recent(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecentQuery>,
) -> Json<Vec<Arc<EventRecord>>> {
    Json(state.engine.recent(q.limit))
}

async fn handle_by_subject(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> Json<Vec<Arc<EventRecord>>> {
    Json(state.engine.by_subject(&subject_id))
}

async fn handle_by_type(
    State(state): State<Arc<AppState>>,
    Path(event_type): Path<String>,
) -> Json<Vec<Arc<EventRecord>>> {
    Json(state.engine.by_type(&event_type))
}

/// Hands the raw body to the feed; decoding and rejection happen in the adapter.
async fn handle_ingest(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    match state.publisher.publish(body.to_vec()).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            tracing::warn!(error = %e, "ingest request refused");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub feed: &'static str,
    pub ledger_size: usize,
    pub ledger_capacity: usize,
    pub ledger_phase: LedgerPhase,
    pub accepted: u64,
    pub rejected: u64,
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.ingest.snapshot();
    let feed = if state.publisher.is_closed() {
        "CLOSED"
    } else {
        "CONNECTED"
    };
    Json(HealthResponse {
        status: "UP",
        service: "analytics-service",
        feed,
        ledger_size: state.engine.ledger_size(),
        ledger_capacity: state.engine.ledger_capacity(),
        ledger_phase: state.engine.ledger_phase(),
        accepted: stats.accepted,
        rejected: stats.rejected,
    })
}
