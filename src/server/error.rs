//! `RagError` → HTTP 응답 매핑
//!
//! 본문은 OpenAI 에러 형식 `{"error":{"type":..,"message":..}}` 입니다.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{GenerationError, RagError};

#[derive(Debug, Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

impl RagError {
    fn status_code(&self) -> StatusCode {
        match self {
            RagError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RagError::Generation(GenerationError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            RagError::Generation(_) | RagError::Embedding(_) => StatusCode::BAD_GATEWAY,
            RagError::Index(_) | RagError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            RagError::InvalidRequest(_) => "invalid_request_error",
            RagError::Generation(GenerationError::Timeout(_)) => "timeout_error",
            RagError::Generation(_) | RagError::Embedding(_) => "upstream_error",
            RagError::Index(_) | RagError::Load(_) => "server_error",
        }
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.error_type(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for RagError {
    fn from(err: JsonRejection) -> Self {
        RagError::InvalidRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RagError::invalid_request("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RagError::from(GenerationError::Timeout(Duration::from_secs(1))).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            RagError::from(GenerationError::Decode("x".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            RagError::from(EmbeddingError::Decode("x".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
