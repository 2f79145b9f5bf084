mod reset;
mod reveal;
mod setup;
mod status;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setup", post(setup::setup))
        .route("/reveal/{id}", post(reveal::reveal))
        .route("/event-status", get(status::event_status))
        .route("/reset", post(reset::reset))
}
