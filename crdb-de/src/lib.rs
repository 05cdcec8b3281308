//! crdb-de library - rowing results data entry service
//!
//! JSON API over the results database: regattas, events, results grids,
//! school maintenance, participation seasons and conference affiliations.

use axum::Router;
use chrono::{DateTime, Utc};
use crdb_common::ChangeBus;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// School renames and deletions, forwarded to SSE clients
    pub changes: ChangeBus,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            changes: ChangeBus::new(),
            started_at: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::regatta_routes())
        .merge(api::result_routes())
        .merge(api::school_routes())
        .merge(api::season_routes())
        .merge(api::conference_routes())
        .merge(api::parse_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
