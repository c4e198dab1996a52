use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{Method, Uri};

use crate::config::ServerIdentity;
use crate::http_backend::models::{ApiResponse, BackendResponse, DefaultResponse, HealthResponse};
use crate::logging::ConsoleLog;
use crate::utils::iso8601_now;

/// Which canned response a request target maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Health,
    Api,
    Default,
}

impl RouteKind {
    /// Classify a raw request target. The method plays no part in dispatch.
    pub fn classify(path: &str) -> Self {
        if path == "/health" {
            RouteKind::Health
        } else if path.starts_with("/api/") {
            RouteKind::Api
        } else {
            RouteKind::Default
        }
    }
}

/// State shared by every request: fixed at startup, read-only afterwards
pub struct BackendState {
    identity: ServerIdentity,
    started_at: Instant,
    log: Arc<dyn ConsoleLog>,
}

impl BackendState {
    pub fn new(identity: ServerIdentity, log: Arc<dyn ConsoleLog>) -> Self {
        Self {
            identity,
            started_at: Instant::now(),
            log,
        }
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Seconds since the backend started
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Build the response for a request target
    pub fn respond(&self, method: &Method, path: &str) -> BackendResponse {
        let server = self.identity.to_string();

        match RouteKind::classify(path) {
            RouteKind::Health => BackendResponse::Health(HealthResponse {
                status: "healthy".to_string(),
                server,
                timestamp: iso8601_now(),
                uptime: self.uptime(),
            }),
            RouteKind::Api => BackendResponse::Api(ApiResponse {
                message: format!("Response from {}", self.identity),
                path: path.to_string(),
                method: method.as_str().to_string(),
                server,
                timestamp: iso8601_now(),
            }),
            RouteKind::Default => BackendResponse::Default(DefaultResponse {
                server,
                path: path.to_string(),
                timestamp: iso8601_now(),
            }),
        }
    }

    /// Write the console line for a handled request
    pub fn log_request(&self, method: &Method, path: &str, status: u16) {
        self.log.line(&format!(
            "[{}] [{}] {} {} {}",
            iso8601_now(),
            self.identity,
            method,
            path,
            status
        ));
    }
}

/// Raw request target: path plus query, or the full URI for absolute-form requests
pub fn request_target(uri: &Uri) -> String {
    if uri.scheme().is_some() {
        uri.to_string()
    } else {
        uri.path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string())
    }
}

/// Fallback handler receiving every request regardless of method or path
pub async fn dispatch(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
) -> BackendResponse {
    let path = request_target(&uri);
    let response = state.respond(&method, &path);

    tracing::debug!(
        method = %method,
        path = %path,
        route = ?RouteKind::classify(&path),
        "Handled request"
    );
    state.log_request(&method, &path, response.status().as_u16());

    response
}
