//! REST API models and request/response types

use serde::{Deserialize, Deserializer, Serialize};

/// Envelope status for successful responses
pub const STATUS_OK: &str = "ok";
/// Envelope status for failed responses
pub const STATUS_ERROR: &str = "error";

/// TOTP generation request
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TotpRequest {
    /// Base32 TOTP secret
    #[serde(deserialize_with = "null_as_empty")]
    pub totp_secret: String,
}

/// Login request
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Kite user ID
    #[serde(deserialize_with = "null_as_empty")]
    pub user_id: String,
    /// Kite password
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
    /// Current TOTP value
    #[serde(deserialize_with = "null_as_empty")]
    pub totp_value: String,
}

/// Enctoken validity request
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnctokenRequest {
    /// Enctoken to check
    #[serde(deserialize_with = "null_as_empty")]
    pub enctoken: String,
}

/// Reads a JSON `null` string field as `""`
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotpResponse {
    pub totp_value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnctokenResponse {
    pub is_valid: bool,
}

/// Uniform response envelope
///
/// Success carries only `status` and `data`; errors carry only `status`,
/// `error_type` and `message`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// `"ok"` or `"error"`
    pub status: String,
    /// Response data (if successful)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Exception class (if failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Error message (if failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful API response
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            data: Some(data),
            error_type: None,
            message: None,
        }
    }

    /// Create an error API response
    #[must_use]
    pub fn error(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            data: None,
            error_type: Some(error_type.into()),
            message: Some(message.into()),
        }
    }
}
