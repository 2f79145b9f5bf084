use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{config::Config, engine::Engine, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SetupRequest {
    participant_names: Vec<String>,
    budget_message: String,
    event_details: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ParticipantLink {
    id: String,
    name: String,
    link: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetupResponse {
    success: bool,
    participants: Vec<ParticipantLink>,
    /// One `name: link` line per participant, ready to paste.
    share_text: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn setup(
    State(engine): State<Arc<Engine>>,
    State(config): State<Arc<Config>>,
    Json(SetupRequest { participant_names, budget_message, event_details }): Json<SetupRequest>,
) -> AppResult<Json<SetupResponse>> {
    let event = engine
        .create_event(&participant_names, &budget_message, &event_details)
        .await?;

    let participants: Vec<ParticipantLink> = event
        .participants
        .into_iter()
        .map(|p| ParticipantLink {
            link: config.reveal_link(p.id.as_str()),
            id: p.id.0,
            name: p.name,
        })
        .collect();

    let share_text = participants
        .iter()
        .map(|p| format!("{}: {}", p.name, p.link))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Json(SetupResponse {
        success: true,
        participants,
        share_text,
    }))
}
