//! Request logging, timeout and panic recovery

use std::{any::Any, net::SocketAddr};

use axum::{
    BoxError,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

use crate::{error::SERVER_EXCEPTION, response};

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        client_ip = %client_ip,
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        duration_ms = duration.as_millis(),
        "Request processed"
    );

    response
}

/// Panic handler for `CatchPanicLayer`
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!("Handler panicked: {}", detail);

    response::error(
        StatusCode::INTERNAL_SERVER_ERROR,
        SERVER_EXCEPTION,
        "Internal server error",
    )
}

/// Error handler for the request timeout layer
pub async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        return response::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            SERVER_EXCEPTION,
            "Request timed out",
        );
    }

    error!("Unhandled service error: {}", err);
    response::error(
        StatusCode::INTERNAL_SERVER_ERROR,
        SERVER_EXCEPTION,
        "Internal server error",
    )
}

/// Extract client IP from request
fn get_client_ip(request: &Request) -> String {
    // Proxies first
    if let Some(first_ip) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
    {
        return first_ip.trim().to_string();
    }

    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|value| value.to_str().ok())
    {
        return real_ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string())
}
