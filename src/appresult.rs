use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::error::SantaError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.downcast_ref::<SantaError>() {
            Some(err @ SantaError::Validation(_)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Some(err @ SantaError::NotFound) => (StatusCode::NOT_FOUND, err.to_string()),
            Some(err @ SantaError::NoAvailableRecipient) => {
                tracing::error!("{err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            _ => {
                tracing::error!("{:#}\n\n{}", self.0, self.0.backtrace());
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong, please contact the organizer".to_owned())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
