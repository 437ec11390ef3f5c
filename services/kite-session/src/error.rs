//! Error types for Kite session operations

use thiserror::Error;

/// Result alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    /// TOTP secret could not be used
    #[error("invalid TOTP secret: {0}")]
    InvalidSecret(String),

    /// System clock is before the unix epoch
    #[error("system clock error: {0}")]
    Clock(String),

    /// Transport-level failure talking to Kite
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Kite answered with a body that does not parse
    #[error("invalid response from Kite: {0}")]
    Decode(#[from] serde_json::Error),

    /// Kite answered with an error envelope
    #[error("{error_type}: {message}")]
    Kite {
        /// Kite exception class, e.g. `TokenException`
        error_type: String,
        /// Human-readable message from Kite
        message: String,
    },

    /// Two-factor step succeeded but did not set a required cookie
    #[error("{0} cookie missing from twofa response")]
    MissingCookie(&'static str),

    /// Kite returned a status the client does not interpret
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
}

impl SessionError {
    /// Build a Kite error from optional envelope fields
    pub(crate) fn kite(error_type: Option<String>, message: Option<String>, status: u16) -> Self {
        Self::Kite {
            error_type: error_type.unwrap_or_else(|| "GeneralException".to_string()),
            message: message.unwrap_or_else(|| format!("HTTP {status}")),
        }
    }
}
