use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ballotbook_shared::constants::REASON_ALREADY_VOTED;
use ballotbook_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Authentication required.")]
    Unauthorized,

    /// Carries the reasons, already joined for display.
    #[error("{0}")]
    Ineligible(String),

    #[error("{0}")]
    NotFound(String),

    /// A cast failed for a reason the voter cannot fix.
    #[error("Vote submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Ineligible(reasons) => ServerError::Ineligible(reasons.join(" ")),
            StoreError::AlreadyVoted => ServerError::Ineligible(REASON_ALREADY_VOTED.to_string()),
            StoreError::NotFound => ServerError::NotFound("Record not found.".to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::MissingFields(_) => {
                (StatusCode::BAD_REQUEST, "Missing required fields.".to_string())
            }
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::Ineligible(reasons) => (StatusCode::FORBIDDEN, reasons.clone()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::SubmissionFailed(cause) => {
                tracing::error!(error = %cause, "cast_vote: transaction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Vote submission failed. Please try again.".to_string(),
                )
            }
            ServerError::Internal(cause) => {
                tracing::error!(error = %cause, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let mut body = serde_json::json!({
            "success": false,
            "error": message,
        });
        if let ServerError::MissingFields(fields) = &self {
            body["missing_fields"] = serde_json::json!(fields);
        }

        (status, axum::Json(body)).into_response()
    }
}
