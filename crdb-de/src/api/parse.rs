//! Input normalization helpers for entry forms
//!
//! Lets a client show "7:04.000" as soon as the operator types "704",
//! using the same parsers the results submit path applies.

use axum::{routing::post, Json, Router};
use crdb_common::race_time::{format_time_seconds, parse_race_time};
use crdb_common::schedule_time::parse_schedule_time;
use serde::{Deserialize, Serialize};

use super::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RaceTimeResponse {
    pub seconds: f64,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct ScheduleTimeResponse {
    /// "HH:MM", or null for blank input
    pub time: Option<String>,
}

/// POST /api/parse/race-time
pub async fn post_race_time(Json(request): Json<ParseRequest>) -> ApiResult<Json<RaceTimeResponse>> {
    let time = parse_race_time(&request.text).map_err(crdb_common::Error::from)?;
    let seconds = time.total_seconds();
    Ok(Json(RaceTimeResponse {
        seconds,
        formatted: format_time_seconds(seconds),
    }))
}

/// POST /api/parse/schedule-time
pub async fn post_schedule_time(
    Json(request): Json<ParseRequest>,
) -> ApiResult<Json<ScheduleTimeResponse>> {
    let time = parse_schedule_time(&request.text).map_err(crdb_common::Error::from)?;
    Ok(Json(ScheduleTimeResponse { time }))
}

pub fn parse_routes() -> Router<AppState> {
    Router::new()
        .route("/api/parse/race-time", post(post_race_time))
        .route("/api/parse/schedule-time", post(post_schedule_time))
}
