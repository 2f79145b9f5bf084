use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Serialize;

use crate::{engine::{Engine, Reveal}, model::ParticipantId, AppResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RevealResponse {
    success: bool,
    assigned_name: String,
    budget_message: String,
    event_details: String,
    participant_name: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn reveal(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> AppResult<Json<RevealResponse>> {
    let Reveal { recipient_name, participant_name, budget_message, event_details } =
        engine.reveal(&ParticipantId(id)).await?;

    Ok(Json(RevealResponse {
        success: true,
        assigned_name: recipient_name,
        budget_message,
        event_details,
        participant_name,
    }))
}
