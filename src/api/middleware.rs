//! Request logging middleware.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use chrono::Local;

use crate::{info, warning};

/// Logs one line per request: time, method, path, status and duration.
///
/// Responses with a 4xx or 5xx status are logged as warnings.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let line = format!(
        "{} {} {} {} ({}ms)",
        Local::now().format("%a %b %d %Y %H:%M:%S"),
        method,
        path,
        status.as_u16(),
        start.elapsed().as_millis()
    );

    if status.is_client_error() || status.is_server_error() {
        warning!("{}", line);
    } else {
        info!("{}", line);
    }

    response
}
