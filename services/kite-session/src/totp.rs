//! TOTP value generation for Kite two-factor login
//!
//! Kite uses standard RFC 6238 parameters: HMAC-SHA1, 6 digits, 30 second
//! step, base32-encoded shared secret.

use std::time::{SystemTime, UNIX_EPOCH};

use totp_rs::{Algorithm, Secret, TOTP};
use tracing::debug;

use crate::error::{Result, SessionError};

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

/// Generate the TOTP value for the current time
///
/// # Errors
/// Returns an error if the secret is empty or not valid base32, or if the
/// system clock is before the unix epoch
pub fn generate_totp_value(totp_secret: &str) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| SessionError::Clock(e.to_string()))?
        .as_secs();

    generate_totp_value_at(totp_secret, now)
}

/// Generate the TOTP value for a given unix timestamp
///
/// # Errors
/// Returns an error if the secret is empty or not valid base32
pub fn generate_totp_value_at(totp_secret: &str, timestamp: u64) -> Result<String> {
    let totp = build_totp(totp_secret)?;
    let value = totp.generate(timestamp);
    debug!(step = timestamp / STEP_SECONDS, "Generated TOTP value");
    Ok(value)
}

fn build_totp(totp_secret: &str) -> Result<TOTP> {
    let secret = normalize_secret(totp_secret);
    if secret.is_empty() {
        return Err(SessionError::InvalidSecret("secret is empty".to_string()));
    }

    let secret_bytes = Secret::Encoded(secret)
        .to_bytes()
        .map_err(|_| SessionError::InvalidSecret("secret is not valid base32".to_string()))?;
    if secret_bytes.is_empty() {
        return Err(SessionError::InvalidSecret("secret decodes to no bytes".to_string()));
    }

    // secrets under 128 bits are accepted
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret_bytes,
    ))
}

/// Canonical base32 form: no whitespace, upper case, no padding
fn normalize_secret(totp_secret: &str) -> String {
    totp_secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .collect::<String>()
        .to_uppercase()
}
