//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response;

/// Malformed or incomplete request
pub const INPUT_EXCEPTION: &str = "InputException";
/// Credentials rejected by Kite
pub const AUTHENTICATION_EXCEPTION: &str = "AuthenticationException";
/// Provider or internal failure
pub const SERVER_EXCEPTION: &str = "ServerException";

/// API error type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 400 `InputException`
    #[error("{0}")]
    Input(String),

    /// 413 `InputException`
    #[error("{0}")]
    PayloadTooLarge(String),

    /// 401 `AuthenticationException`
    #[error("{0}")]
    Authentication(String),

    /// 500 `ServerException`
    #[error("{0}")]
    Server(String),
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope `error_type` for this error
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Input(_) | Self::PayloadTooLarge(_) => INPUT_EXCEPTION,
            Self::Authentication(_) => AUTHENTICATION_EXCEPTION,
            Self::Server(_) => SERVER_EXCEPTION,
        }
    }

    /// Error message
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Input(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Authentication(msg)
            | Self::Server(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        response::error(self.status(), self.error_type(), self.message())
    }
}
