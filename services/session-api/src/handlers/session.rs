//! Kite session handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use kite_session::SessionProvider;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::{
    error::ApiError,
    models::{EnctokenRequest, EnctokenResponse, LoginRequest, TotpRequest, TotpResponse},
    response,
};

/// Session handlers
#[derive(Clone)]
pub struct SessionHandlers {
    provider: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for SessionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandlers")
            .field("provider", &"Arc<dyn SessionProvider>")
            .finish()
    }
}

impl SessionHandlers {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self { provider }
    }

    /// `POST /session/totp`
    pub async fn generate_totp(
        State(handlers): State<Self>,
        headers: HeaderMap,
        body: Result<Bytes, BytesRejection>,
    ) -> Result<Response, ApiError> {
        let request: TotpRequest = bind(&headers, &read_body(body)?)?;

        if request.totp_secret.is_empty() {
            return Err(ApiError::Input("totp_secret is required".to_string()));
        }

        let totp_value = handlers
            .provider
            .generate_totp_value(&request.totp_secret)
            .map_err(|e| {
                error!("TOTP generation failed: {}", e);
                ApiError::Server("Failed to generate TOTP value".to_string())
            })?;

        Ok(response::success(TotpResponse { totp_value }))
    }

    /// `POST /session/login`
    pub async fn generate_session(
        State(handlers): State<Self>,
        headers: HeaderMap,
        body: Result<Bytes, BytesRejection>,
    ) -> Result<Response, ApiError> {
        let request: LoginRequest = bind(&headers, &read_body(body)?)?;

        if request.user_id.is_empty() || request.password.is_empty() || request.totp_value.is_empty()
        {
            return Err(ApiError::Input(
                "user_id, password, and totp_value are required".to_string(),
            ));
        }

        info!("Login request for user: {}", request.user_id);

        match handlers
            .provider
            .generate_session(&request.user_id, &request.password, &request.totp_value)
            .await
        {
            Ok(session) => {
                info!("Login successful for user: {}", request.user_id);
                Ok(response::success(session))
            }
            Err(e) => {
                warn!("Login failed for user {}: {}", request.user_id, e);
                Err(ApiError::Authentication(format!("Login failed: {e}")))
            }
        }
    }

    /// `POST /session/valid`
    pub async fn check_enctoken(
        State(handlers): State<Self>,
        headers: HeaderMap,
        body: Result<Bytes, BytesRejection>,
    ) -> Result<Response, ApiError> {
        let request: EnctokenRequest = bind(&headers, &read_body(body)?)?;

        if request.enctoken.is_empty() {
            return Err(ApiError::Input("enctoken is required".to_string()));
        }

        let is_valid = handlers
            .provider
            .check_enctoken_valid(&request.enctoken)
            .await
            .map_err(|e| {
                error!("Enctoken check failed: {}", e);
                ApiError::Server(format!("Failed to check enctoken: {e}"))
            })?;

        debug!(is_valid, "Enctoken checked");
        Ok(response::success(EnctokenResponse { is_valid }))
    }
}

/// Buffer the request body, mapping the body limit to a 413 envelope
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        debug!("Rejected request body: {}", rejection);
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Request body too large".to_string())
        } else {
            ApiError::Input("Invalid request body".to_string())
        }
    })
}

/// Bind a JSON body to a request shape
///
/// An empty body or a JSON `null` binds as `{}`. A non-empty body must be
/// sent as `application/json`.
fn bind<T: DeserializeOwned + Default>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    if !is_json(headers) {
        debug!("Rejected request body: content type is not application/json");
        return Err(ApiError::Input("Invalid request body".to_string()));
    }

    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| {
            debug!("Rejected request body: {}", e);
            ApiError::Input("Invalid request body".to_string())
        })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("application/json"))
}
