use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde::Serialize;

use crate::{engine::Engine, model::Event, AppResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ParticipantStatus {
    id: String,
    name: String,
    has_revealed: bool,
}

/// Roster without assignments; who gifts whom never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventSummary {
    participants: Vec<ParticipantStatus>,
    revealed_count: usize,
    budget_message: String,
    event_details: String,
    created_at: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    event: Option<EventSummary>,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        let revealed_count = event.revealed_count();
        let created_at = (event.created_at.unix_timestamp_nanos() / 1_000_000) as i64;

        Self {
            participants: event
                .participants
                .into_iter()
                .map(|p| ParticipantStatus {
                    id: p.id.0,
                    name: p.name,
                    has_revealed: p.has_revealed,
                })
                .collect(),
            revealed_count,
            budget_message: event.budget_message,
            event_details: event.event_details,
            created_at,
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn event_status(
    State(engine): State<Arc<Engine>>,
) -> AppResult<Json<StatusResponse>> {
    let event = engine.status().await?;
    Ok(Json(StatusResponse {
        event: event.map(EventSummary::from),
    }))
}
