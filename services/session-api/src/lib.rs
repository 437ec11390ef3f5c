//! mbservices session API
//!
//! HTTP front for Kite session management:
//! - `POST /session/totp` - TOTP value from a secret
//! - `POST /session/login` - credential + TOTP login
//! - `POST /session/valid` - enctoken validity check
//!
//! Every response uses the `{status, data}` / `{status, error_type, message}`
//! envelope.

use anyhow::Result;

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod server;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use server::SessionApiServer;

/// Start the session API server
pub async fn start_server(config: ServiceConfig) -> Result<()> {
    let server = SessionApiServer::new(config)?;
    server.start().await
}
