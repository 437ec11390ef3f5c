//! API handlers

pub mod session;

pub use session::SessionHandlers;
