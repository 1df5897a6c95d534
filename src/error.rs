use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Error taxonomy for the HTTP surface.
///
/// Parse anomalies never show up here - malformed playlist entries are
/// skipped or defaulted inside the parser and the request still succeeds.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid caller input (absent url/content, bad encoding)
    #[error("{0}")]
    BadRequest(String),

    /// Network failure or non-2xx talking to the upstream resource
    #[error("{0}")]
    UpstreamFetch(String),

    /// Upstream did not respond within the bound for this request class
    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a reqwest error to the taxonomy, keeping the upstream message
    pub fn from_upstream(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout
        } else {
            Self::UpstreamFetch(err.to_string())
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UpstreamFetch("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
