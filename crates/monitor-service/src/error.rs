use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Domain error taxonomy. Classification, aggregation and parking errors are
/// surfaced synchronously to the caller; `RemoteInference` never leaves the
/// predictive adapter, which converts it to the deterministic fallback.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    #[error("unknown slot '{0}'")]
    UnknownSlot(String),

    #[error("parking fleet has no provisioned slots")]
    EmptyFleet,

    #[error("remote inference failed: {0}")]
    RemoteInference(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        let message = err.to_string();
        match err {
            MonitorError::InvalidInput(_) => ApiError::BadRequest(message),
            MonitorError::UnknownZone(_) | MonitorError::UnknownSlot(_) => {
                ApiError::NotFound(message)
            }
            MonitorError::EmptyFleet => ApiError::Conflict(message),
            MonitorError::RemoteInference(_) => ApiError::Internal(message),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_errors_map_to_expected_status_codes() {
        let cases = [
            (
                MonitorError::InvalidInput("count must be non-negative".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                MonitorError::UnknownZone("atrium".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                MonitorError::UnknownSlot("P-99".into()),
                StatusCode::NOT_FOUND,
            ),
            (MonitorError::EmptyFleet, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn error_messages_carry_the_offending_id() {
        let err = MonitorError::UnknownSlot("P-42".into());
        assert!(err.to_string().contains("P-42"));
    }
}
