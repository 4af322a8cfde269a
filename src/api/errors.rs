//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request tracking.

use crate::errors::{FairFlipError, LedgerError, RoomError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (NOT_FOUND, BAD_REQUEST, CONFLICT, etc.)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error types with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    InternalError(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound(message),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    pub fn unauthorized(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized(message),
            request_id,
        }
    }

    /// Map a domain error onto its HTTP class
    pub fn from_error(request_id: String, err: FairFlipError) -> Self {
        let message = err.to_string();
        let kind = match &err {
            FairFlipError::MalformedInput(_) => ApiErrorKind::BadRequest(message),
            FairFlipError::PrimitiveUnavailable(_) => ApiErrorKind::ServiceUnavailable(message),
            FairFlipError::SequenceMisuse(_) | FairFlipError::Protocol(_) => {
                ApiErrorKind::Conflict(message)
            }
            FairFlipError::Room(room) => match room {
                RoomError::NotFound(_) => ApiErrorKind::NotFound(message),
                RoomError::NotParticipant { .. } | RoomError::NotCreator(_) => {
                    ApiErrorKind::Forbidden(message)
                }
                RoomError::OwnRoom(_) => ApiErrorKind::BadRequest(message),
                RoomError::RoomFull(_) | RoomError::NotReady(_) => ApiErrorKind::Conflict(message),
                RoomError::IdsExhausted => ApiErrorKind::ServiceUnavailable(message),
            },
            FairFlipError::Ledger(LedgerError::InsufficientPoints { .. }) => {
                ApiErrorKind::BadRequest(message)
            }
            FairFlipError::Auth(_) => ApiErrorKind::Unauthorized(message),
            FairFlipError::Ledger(_) | FairFlipError::Configuration(_) | FairFlipError::Io(_) => {
                ApiErrorKind::InternalError(message)
            }
        };

        Self { kind, request_id }
    }

    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match &self.kind {
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.as_str()),
            ApiErrorKind::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.as_str()),
            ApiErrorKind::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.as_str()),
            ApiErrorKind::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.as_str()),
            ApiErrorKind::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.as_str()),
            ApiErrorKind::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.as_str())
            }
            ApiErrorKind::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg.as_str())
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (_, code, message) = self.parts();
        write!(f, "[{}] {}: {}", self.request_id, code, message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
            },
        });

        (status, body).into_response()
    }
}
