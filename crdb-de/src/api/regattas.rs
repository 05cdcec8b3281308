//! Regatta and event endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use crdb_common::db::events::{
    add_event, delete_event, event_entry_count, get_event, list_all_events, list_events,
    EventDeleteCounts, NewEvent,
};
use crdb_common::db::regattas::{
    add_regatta, delete_regatta, get_regatta, list_regattas, regatta_counts, NewRegatta,
    RegattaCounts, RegattaDeleteCounts,
};
use crdb_common::db::{Event, EventListing, Regatta};
use serde::Serialize;

use super::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RegattaView {
    #[serde(flatten)]
    pub regatta: Regatta,
    pub display_name: String,
}

impl From<Regatta> for RegattaView {
    fn from(regatta: Regatta) -> Self {
        let display_name = regatta.display_name();
        Self {
            regatta,
            display_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegattaDetail {
    #[serde(flatten)]
    pub regatta: RegattaView,
    pub counts: RegattaCounts,
}

#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub display_name: String,
}

impl TryFrom<Event> for EventView {
    type Error = crdb_common::Error;

    fn try_from(event: Event) -> Result<Self, Self::Error> {
        let display_name = event.display_name()?;
        Ok(Self { event, display_name })
    }
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: EventView,
    pub entry_count: i64,
}

/// GET /api/regattas
pub async fn get_regattas(State(state): State<AppState>) -> ApiResult<Json<Vec<RegattaView>>> {
    let regattas = list_regattas(&state.db).await?;
    Ok(Json(regattas.into_iter().map(RegattaView::from).collect()))
}

/// POST /api/regattas
pub async fn post_regatta(
    State(state): State<AppState>,
    Json(new): Json<NewRegatta>,
) -> ApiResult<(StatusCode, Json<RegattaView>)> {
    let regatta = add_regatta(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(regatta.into())))
}

/// GET /api/regattas/:id
///
/// Includes the event and entry counts a delete would remove.
pub async fn get_regatta_detail(
    State(state): State<AppState>,
    Path(regatta_id): Path<i64>,
) -> ApiResult<Json<RegattaDetail>> {
    let regatta = get_regatta(&state.db, regatta_id).await?;
    let counts = regatta_counts(&state.db, regatta_id).await?;
    Ok(Json(RegattaDetail {
        regatta: regatta.into(),
        counts,
    }))
}

/// DELETE /api/regattas/:id
pub async fn remove_regatta(
    State(state): State<AppState>,
    Path(regatta_id): Path<i64>,
) -> ApiResult<Json<RegattaDeleteCounts>> {
    Ok(Json(delete_regatta(&state.db, regatta_id).await?))
}

/// GET /api/regattas/:id/events
pub async fn get_regatta_events(
    State(state): State<AppState>,
    Path(regatta_id): Path<i64>,
) -> ApiResult<Json<Vec<EventView>>> {
    get_regatta(&state.db, regatta_id).await?;
    let events = list_events(&state.db, regatta_id)
        .await?
        .into_iter()
        .map(EventView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(events))
}

/// POST /api/regattas/:id/events
pub async fn post_event(
    State(state): State<AppState>,
    Path(regatta_id): Path<i64>,
    Json(new): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<EventView>)> {
    let event = add_event(&state.db, regatta_id, new).await?;
    Ok((StatusCode::CREATED, Json(EventView::try_from(event)?)))
}

/// GET /api/events
pub async fn get_all_events(State(state): State<AppState>) -> ApiResult<Json<Vec<EventListing>>> {
    Ok(Json(list_all_events(&state.db).await?))
}

/// GET /api/events/:id
pub async fn get_event_detail(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<EventDetail>> {
    let event = get_event(&state.db, event_id).await?;
    let entry_count = event_entry_count(&state.db, event_id).await?;
    Ok(Json(EventDetail {
        event: EventView::try_from(event)?,
        entry_count,
    }))
}

/// DELETE /api/events/:id
pub async fn remove_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<EventDeleteCounts>> {
    Ok(Json(delete_event(&state.db, event_id).await?))
}

pub fn regatta_routes() -> Router<AppState> {
    Router::new()
        .route("/api/regattas", get(get_regattas).post(post_regatta))
        .route(
            "/api/regattas/:id",
            get(get_regatta_detail).delete(remove_regatta),
        )
        .route(
            "/api/regattas/:id/events",
            get(get_regatta_events).post(post_event),
        )
        .route("/api/events", get(get_all_events))
        .route("/api/events/:id", get(get_event_detail).delete(remove_event))
}
