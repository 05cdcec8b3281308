//! Participation season endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use crdb_common::db::participations::{
    create_season, delete_participation_season, list_participation_seasons,
    populate_initial_participations, preview_season, season_participations, set_participation,
    CreateSeasonReport,
};
use crdb_common::db::SchoolParticipation;
use crdb_common::season::OverlapPlan;
use crdb_common::{Season, TeamCategory};
use serde::{Deserialize, Serialize};

use super::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SeasonView {
    #[serde(flatten)]
    pub season: Season,
    pub display_name: String,
}

impl From<Season> for SeasonView {
    fn from(season: Season) -> Self {
        Self {
            display_name: season.display_name(),
            season,
        }
    }
}

/// Seasons are named the way they are displayed: "2024-2026", "2025 - current"
#[derive(Debug, Deserialize)]
pub struct SeasonRequest {
    pub season: String,
    pub copy_from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipationUpdate {
    pub school_id: i64,
    pub season: String,
    pub category: TeamCategory,
    pub participating: bool,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

fn parse_season(text: &str) -> ApiResult<Season> {
    Ok(Season::parse_display(text).map_err(crdb_common::Error::from)?)
}

/// GET /api/seasons
pub async fn get_seasons(State(state): State<AppState>) -> ApiResult<Json<Vec<SeasonView>>> {
    let seasons = list_participation_seasons(&state.db).await?;
    Ok(Json(seasons.into_iter().map(SeasonView::from).collect()))
}

/// POST /api/seasons/preview
///
/// What creating the season would do to existing ones; nothing is written.
pub async fn post_preview(
    State(state): State<AppState>,
    Json(request): Json<SeasonRequest>,
) -> ApiResult<Json<OverlapPlan>> {
    let season = parse_season(&request.season)?;
    Ok(Json(preview_season(&state.db, &season).await?))
}

/// POST /api/seasons
pub async fn post_season(
    State(state): State<AppState>,
    Json(request): Json<SeasonRequest>,
) -> ApiResult<(StatusCode, Json<CreateSeasonReport>)> {
    let season = parse_season(&request.season)?;
    let copy_from = request
        .copy_from
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_season)
        .transpose()?;

    let report = create_season(&state.db, season, copy_from).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/seasons/:start_year
pub async fn get_season(
    State(state): State<AppState>,
    Path(start_year): Path<i32>,
) -> ApiResult<Json<Vec<SchoolParticipation>>> {
    Ok(Json(season_participations(&state.db, start_year).await?))
}

/// DELETE /api/seasons/:start_year
pub async fn delete_season(
    State(state): State<AppState>,
    Path(start_year): Path<i32>,
) -> ApiResult<Json<CountResponse>> {
    let count = delete_participation_season(&state.db, start_year).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/seasons/:start_year/populate
///
/// Seeds an open season from the teams each school already fields.
pub async fn post_populate(
    State(state): State<AppState>,
    Path(start_year): Path<i32>,
) -> ApiResult<Json<CountResponse>> {
    let count = populate_initial_participations(&state.db, start_year).await?;
    Ok(Json(CountResponse { count }))
}

/// PUT /api/seasons/participation
pub async fn put_participation(
    State(state): State<AppState>,
    Json(update): Json<ParticipationUpdate>,
) -> ApiResult<StatusCode> {
    set_participation(
        &state.db,
        update.school_id,
        &update.season,
        update.category,
        update.participating,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn season_routes() -> Router<AppState> {
    Router::new()
        .route("/api/seasons", get(get_seasons).post(post_season))
        .route("/api/seasons/preview", post(post_preview))
        .route("/api/seasons/participation", put(put_participation))
        .route(
            "/api/seasons/:start_year",
            get(get_season).delete(delete_season),
        )
        .route("/api/seasons/:start_year/populate", post(post_populate))
}
