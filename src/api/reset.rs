use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};

use crate::{engine::Engine, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn reset(
    State(engine): State<Arc<Engine>>,
) -> AppResult<Json<Value>> {
    engine.delete_event().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Event deleted successfully",
    })))
}
