use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("Only volunteers can publish timeslots")]
    NotVolunteer,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Timeslot is not available")]
    SlotUnavailable,
    #[error("You cannot book your own timeslot")]
    SelfBooking,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Missing or invalid session token")]
    NotLoggedIn,
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            ServiceError::DuplicateEmail => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials | ServiceError::NotLoggedIn => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Validation(_)
            | ServiceError::SlotUnavailable
            | ServiceError::SelfBooking => StatusCode::BAD_REQUEST,
            ServiceError::NotVolunteer | ServiceError::Unauthorized => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let message = match &self {
            ServiceError::Database(err) => {
                error!(?err, "request failed on the database");
                "Internal database error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}
