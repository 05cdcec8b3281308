//! Conference affiliation endpoints
//!
//! Season editing is addressed by team category and academic start year:
//! `/api/conferences/openweight_women/seasons/2024` is the 2024-2025 season.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use crdb_common::db::conferences::{
    add_conference_affiliation, assign_school, available_schools, conference_history,
    conference_season, copy_conference_season, current_conference, delete_conference,
    delete_conference_season, list_conference_seasons, remove_school,
    update_conference_affiliation,
};
use crdb_common::db::ConferenceAffiliation;
use crdb_common::TeamCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub crr_name: String,
    pub conference: String,
}

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub from_year: i32,
}

#[derive(Debug, Deserialize)]
pub struct NewAffiliation {
    pub conference: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AffiliationChange {
    pub conference: String,
    pub change_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct TeamConferences {
    pub team_id: i64,
    pub current: String,
    pub history: Vec<ConferenceAffiliation>,
}

/// GET /api/conferences/:category/seasons
pub async fn get_seasons(
    State(state): State<AppState>,
    Path(category): Path<TeamCategory>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(list_conference_seasons(&state.db, category).await?))
}

/// GET /api/conferences/:category/seasons/:year
pub async fn get_season(
    State(state): State<AppState>,
    Path((category, year)): Path<(TeamCategory, i32)>,
) -> ApiResult<Json<BTreeMap<String, Vec<String>>>> {
    Ok(Json(conference_season(&state.db, category, year).await?))
}

/// DELETE /api/conferences/:category/seasons/:year
pub async fn delete_season(
    State(state): State<AppState>,
    Path((category, year)): Path<(TeamCategory, i32)>,
) -> ApiResult<Json<CountResponse>> {
    let count = delete_conference_season(&state.db, category, year).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/conferences/:category/seasons/:year/available
pub async fn get_available(
    State(state): State<AppState>,
    Path((category, year)): Path<(TeamCategory, i32)>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(available_schools(&state.db, category, year).await?))
}

/// PUT /api/conferences/:category/seasons/:year/schools
pub async fn put_school(
    State(state): State<AppState>,
    Path((category, year)): Path<(TeamCategory, i32)>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<ConferenceAffiliation>> {
    let affiliation =
        assign_school(&state.db, category, year, &request.crr_name, &request.conference).await?;
    Ok(Json(affiliation))
}

/// DELETE /api/conferences/:category/seasons/:year/schools/:crr_name
pub async fn delete_school(
    State(state): State<AppState>,
    Path((category, year, crr_name)): Path<(TeamCategory, i32, String)>,
) -> ApiResult<Json<CountResponse>> {
    let count = remove_school(&state.db, category, year, &crr_name).await?;
    Ok(Json(CountResponse { count }))
}

/// DELETE /api/conferences/:category/seasons/:year/conferences/:conference
pub async fn delete_one_conference(
    State(state): State<AppState>,
    Path((category, year, conference)): Path<(TeamCategory, i32, String)>,
) -> ApiResult<Json<CountResponse>> {
    let count = delete_conference(&state.db, category, year, &conference).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/conferences/:category/seasons/:year/copy
///
/// Fills season `:year` from `from_year`.
pub async fn post_copy(
    State(state): State<AppState>,
    Path((category, year)): Path<(TeamCategory, i32)>,
    Json(request): Json<CopyRequest>,
) -> ApiResult<Json<CountResponse>> {
    let count = copy_conference_season(&state.db, category, request.from_year, year).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/teams/:id/conferences
pub async fn get_team_conferences(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
) -> ApiResult<Json<TeamConferences>> {
    let history = conference_history(&state.db, team_id).await?;
    let current = current_conference(&state.db, team_id).await?;
    Ok(Json(TeamConferences {
        team_id,
        current,
        history,
    }))
}

/// POST /api/teams/:id/conferences
pub async fn post_team_conference(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
    Json(new): Json<NewAffiliation>,
) -> ApiResult<(StatusCode, Json<ConferenceAffiliation>)> {
    let affiliation =
        add_conference_affiliation(&state.db, team_id, &new.conference, new.start_date, new.end_date)
            .await?;
    Ok((StatusCode::CREATED, Json(affiliation)))
}

/// PUT /api/teams/:id/conferences
///
/// Ends the open affiliation on `change_date` and starts the new one there.
pub async fn put_team_conference(
    State(state): State<AppState>,
    Path(team_id): Path<i64>,
    Json(change): Json<AffiliationChange>,
) -> ApiResult<Json<ConferenceAffiliation>> {
    let affiliation =
        update_conference_affiliation(&state.db, team_id, &change.conference, change.change_date)
            .await?;
    Ok(Json(affiliation))
}

pub fn conference_routes() -> Router<AppState> {
    Router::new()
        .route("/api/conferences/:category/seasons", get(get_seasons))
        .route(
            "/api/conferences/:category/seasons/:year",
            get(get_season).delete(delete_season),
        )
        .route(
            "/api/conferences/:category/seasons/:year/available",
            get(get_available),
        )
        .route(
            "/api/conferences/:category/seasons/:year/schools",
            put(put_school),
        )
        .route(
            "/api/conferences/:category/seasons/:year/schools/:crr_name",
            delete(delete_school),
        )
        .route(
            "/api/conferences/:category/seasons/:year/conferences/:conference",
            delete(delete_one_conference),
        )
        .route(
            "/api/conferences/:category/seasons/:year/copy",
            post(post_copy),
        )
        .route(
            "/api/teams/:id/conferences",
            get(get_team_conferences)
                .post(post_team_conference)
                .put(put_team_conference),
        )
}
