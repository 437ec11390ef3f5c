//! Session API server implementation

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router, error_handling::HandleErrorLayer, extract::DefaultBodyLimit, middleware, routing::post,
};
use kite_session::{KiteSession, SessionProvider};
use tokio::net::TcpListener;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::ServiceConfig,
    handlers::SessionHandlers,
    middleware::{handle_panic, handle_timeout, logging_middleware},
};

pub const TOTP_PATH: &str = "/session/totp";
pub const LOGIN_PATH: &str = "/session/login";
pub const VALID_PATH: &str = "/session/valid";

/// Session API server
pub struct SessionApiServer {
    config: ServiceConfig,
    provider: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for SessionApiServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionApiServer")
            .field("config", &self.config)
            .field("provider", &"Arc<dyn SessionProvider>")
            .finish()
    }
}

impl SessionApiServer {
    /// Create a server backed by the Kite web client
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let kite = KiteSession::new(config.kite.clone())?;
        info!("Kite client targeting {}", config.kite.base_url);
        Ok(Self::with_provider(config, Arc::new(kite)))
    }

    /// Create a server with an explicit session provider
    pub fn with_provider(config: ServiceConfig, provider: Arc<dyn SessionProvider>) -> Self {
        Self { config, provider }
    }

    /// Build the router with all routes and middleware
    pub fn router(&self) -> Router {
        let handlers = SessionHandlers::new(Arc::clone(&self.provider));

        Router::new()
            .route(TOTP_PATH, post(SessionHandlers::generate_totp))
            .route(LOGIN_PATH, post(SessionHandlers::generate_session))
            .route(VALID_PATH, post(SessionHandlers::check_enctoken))
            .with_state(handlers)
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_timeout))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        self.config.timeout_seconds,
                    ))),
            )
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(middleware::from_fn(logging_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until shutdown
    pub async fn start(self) -> Result<()> {
        let addr = self.config.server_address();

        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind TCP listener to {}: {}", addr, e);
                return Err(anyhow::anyhow!("Failed to bind to address {}: {}", addr, e));
            }
        };

        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router();

        info!("Starting mbservices server on {}", listener.local_addr()?);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server encountered a fatal error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

/// API route documentation
pub fn print_routes() {
    println!("mbservices Routes:");
    println!("==================");
    println!();
    println!("Kite session:");
    println!("  POST {TOTP_PATH}   {{totp_secret}}                  - Generate TOTP value");
    println!("  POST {LOGIN_PATH}  {{user_id,password,totp_value}}  - Log in, returns session");
    println!("  POST {VALID_PATH}  {{enctoken}}                     - Check enctoken validity");
    println!();
    println!("Responses use the envelope:");
    println!("  {{\"status\":\"ok\",\"data\":...}}");
    println!("  {{\"status\":\"error\",\"error_type\":...,\"message\":...}}");
}
