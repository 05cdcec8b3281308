//! Server-Sent Events for school changes
//!
//! Clients holding a school list (entry grids, conference editors) listen
//! here and refresh when a school is created, renamed, edited or deleted.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// GET /api/schools/changes
pub async fn school_change_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to school changes");

    let mut rx = state.changes.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(change) => match serde_json::to_string(&change) {
                    Ok(data) => {
                        debug!("SSE: Sending {}", change.event_name());
                        yield Ok(Event::default().event(change.event_name()).data(data));
                    }
                    Err(e) => warn!("SSE: Failed to serialize {:?}: {}", change, e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: Client lagged, {} school change(s) dropped", skipped);
                    yield Ok(Event::default().event("resync").data(skipped.to_string()));
                }
                Err(RecvError::Closed) => {
                    info!("SSE: School change stream closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
