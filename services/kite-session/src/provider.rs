//! Session provider abstraction

use async_trait::async_trait;

use crate::{error::Result, session::Session};

/// Capability set the HTTP layer needs from a session backend
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Generate the current TOTP value for a base32 secret
    fn generate_totp_value(&self, totp_secret: &str) -> Result<String>;

    /// Log in with credentials and a TOTP value, producing a session
    async fn generate_session(
        &self,
        user_id: &str,
        password: &str,
        totp_value: &str,
    ) -> Result<Session>;

    /// Check whether an enctoken is still accepted by Kite
    async fn check_enctoken_valid(&self, enctoken: &str) -> Result<bool>;
}
