//! Kite session management
//!
//! Client-side pieces of the Kite (Zerodha) web login:
//! - TOTP value generation from a base32 secret
//! - Credential + TOTP login producing an enctoken session
//! - Enctoken validity checks against the OMS profile endpoint
//!
//! Consumers depend on the [`SessionProvider`] trait; [`KiteSession`] is the
//! production implementation.

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod totp;

pub use config::KiteConfig;
pub use error::{Result, SessionError};
pub use provider::SessionProvider;
pub use session::{KiteSession, Session};
pub use totp::{generate_totp_value, generate_totp_value_at};
