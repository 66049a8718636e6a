/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - 認証失敗 (Rejection) と、その HTTP 表現 (401 + 設定済み JSON payload)
 * - ガードの組み込みミス (GuardError::RequestNotFound) を認証失敗と区別する
 */
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;

/// Why a request carrying (or lacking) a token was refused.
///
/// The six kinds are mutually exclusive; each maps to one configurable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotFound,
    BearerFormat,
    DecodeError,
    Expired,
    WrongType,
    NotYetValid,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::BearerFormat => "bearer_format",
            Self::DecodeError => "decode_error",
            Self::Expired => "expired",
            Self::WrongType => "wrong_type",
            Self::NotYetValid => "not_yet_valid",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejection paired with the payload configured for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthRejection {
    pub kind: Rejection,
    pub body: Value,
}

impl AuthRejection {
    pub fn new(kind: Rejection, body: Value) -> Self {
        Self { kind, body }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self.body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("unauthorized: {}", .0.kind)]
    Unauthorized(AuthRejection),
    /// The wrapped handler was called without anything the guard can read as a request.
    #[error("in \"{handler}\", no request object was found among the handler arguments")]
    RequestNotFound { handler: &'static str },
}

impl From<AuthRejection> for GuardError {
    fn from(rejection: AuthRejection) -> Self {
        Self::Unauthorized(rejection)
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::Unauthorized(rejection) => rejection.into_response(),
            GuardError::RequestNotFound { .. } => AppError::Internal.into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Configuration problems must never leak to a client.
            AppError::Config(_) | AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "internal server error".to_string(),
            ),
        };

        let body = ErrorResponseBody {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}
