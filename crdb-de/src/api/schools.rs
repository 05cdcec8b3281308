//! School maintenance and team listing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use crdb_common::db::schools::{
    add_school, crr_name_usage, delete_schools, list_schools, list_teams, update_school_field,
    NewSchool, SchoolField, SchoolUsage,
};
use crdb_common::db::{School, Team};
use crdb_common::TeamCategory;
use serde::{Deserialize, Serialize};

use super::{sse::school_change_stream, ApiResult};
use crate::AppState;

/// One-field edit, as made from the schools grid
#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: SchoolField,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub crr_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub crr_name: String,
    #[serde(flatten)]
    pub usage: SchoolUsage,
    pub unused: bool,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub category: Option<TeamCategory>,
}

/// GET /api/schools
pub async fn get_schools(State(state): State<AppState>) -> ApiResult<Json<Vec<School>>> {
    Ok(Json(list_schools(&state.db).await?))
}

/// POST /api/schools
pub async fn post_school(
    State(state): State<AppState>,
    Json(new): Json<NewSchool>,
) -> ApiResult<(StatusCode, Json<School>)> {
    let school = add_school(&state.db, &state.changes, new).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

/// PATCH /api/schools/:id
pub async fn patch_school(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
    Json(update): Json<FieldUpdate>,
) -> ApiResult<Json<School>> {
    let school =
        update_school_field(&state.db, &state.changes, school_id, update.field, &update.value)
            .await?;
    Ok(Json(school))
}

/// POST /api/schools/delete
///
/// Deletes by CRR name; teams, affiliations, participation and entries go
/// with each school.
pub async fn post_delete_schools(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = delete_schools(&state.db, &state.changes, &request.crr_names).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// GET /api/schools/usage/:crr_name
pub async fn get_usage(
    State(state): State<AppState>,
    Path(crr_name): Path<String>,
) -> ApiResult<Json<UsageResponse>> {
    let usage = crr_name_usage(&state.db, &crr_name).await?;
    Ok(Json(UsageResponse {
        crr_name,
        unused: usage.is_unused(),
        usage,
    }))
}

/// GET /api/teams?category=heavyweight_men
pub async fn get_teams(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> ApiResult<Json<Vec<Team>>> {
    Ok(Json(list_teams(&state.db, query.category).await?))
}

pub fn school_routes() -> Router<AppState> {
    Router::new()
        .route("/api/schools", get(get_schools).post(post_school))
        .route("/api/schools/:id", patch(patch_school))
        .route("/api/schools/delete", post(post_delete_schools))
        .route("/api/schools/usage/:crr_name", get(get_usage))
        .route("/api/schools/changes", get(school_change_stream))
        .route("/api/teams", get(get_teams))
}
