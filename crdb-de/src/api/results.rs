//! Entry and results endpoints for a single event

use axum::{
    extract::{Path, State},
    routing::{get, patch, put},
    Json, Router,
};
use crdb_common::db::results::{
    eligible_schools, list_event_entries, submit_results, update_entry_notes,
    update_event_notes, EntryView, ResultRow, SubmitReport,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::ApiResult;
use crate::AppState;

/// Results grid, finishers in order
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub rows: Vec<ResultRow>,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

/// Notes keyed by CRR name
#[derive(Debug, Deserialize)]
pub struct EventNotesRequest {
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct EventNotesResponse {
    pub updated: u64,
}

/// GET /api/events/:id/entries
pub async fn get_entries(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<Vec<EntryView>>> {
    Ok(Json(list_event_entries(&state.db, event_id).await?))
}

/// GET /api/events/:id/eligible-schools
pub async fn get_eligible_schools(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(eligible_schools(&state.db, event_id).await?))
}

/// PUT /api/events/:id/results
///
/// Replaces all entries and results of the event.
pub async fn put_results(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<Json<SubmitReport>> {
    Ok(Json(submit_results(&state.db, event_id, &request.rows).await?))
}

/// PATCH /api/entries/:id/notes
pub async fn patch_entry_notes(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
    Json(request): Json<NotesRequest>,
) -> ApiResult<Json<Value>> {
    update_entry_notes(&state.db, entry_id, &request.notes).await?;
    Ok(Json(json!({ "entry_id": entry_id, "notes": request.notes.trim() })))
}

/// PUT /api/events/:id/notes
pub async fn put_event_notes(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(request): Json<EventNotesRequest>,
) -> ApiResult<Json<EventNotesResponse>> {
    let updated = update_event_notes(&state.db, event_id, &request.notes).await?;
    Ok(Json(EventNotesResponse { updated }))
}

pub fn result_routes() -> Router<AppState> {
    Router::new()
        .route("/api/events/:id/entries", get(get_entries))
        .route("/api/events/:id/eligible-schools", get(get_eligible_schools))
        .route("/api/events/:id/results", put(put_results))
        .route("/api/events/:id/notes", put(put_event_notes))
        .route("/api/entries/:id/notes", patch(patch_entry_notes))
}
