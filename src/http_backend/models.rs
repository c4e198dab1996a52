use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Header naming the backend that produced an API response
pub const BACKEND_SERVER_HEADER: &str = "x-backend-server";

/// Health status response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,

    /// Server name
    pub server: String,

    /// Time the response was built
    pub timestamp: String,

    /// Seconds since the backend started
    pub uptime: f64,
}

/// Response for any path under `/api/`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse {
    /// "Response from <server>"
    pub message: String,

    /// Request target exactly as received
    pub path: String,

    /// HTTP method exactly as received
    pub method: String,

    /// Server name
    pub server: String,

    /// Time the response was built
    pub timestamp: String,
}

/// HTML page returned for every other path
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultResponse {
    pub server: String,
    pub path: String,
    pub timestamp: String,
}

impl DefaultResponse {
    /// Render the page. The path is interpolated verbatim.
    pub fn html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>{server}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 50px; }}
        .info {{ background: #f0f0f0; padding: 20px; border-radius: 5px; }}
    </style>
</head>
<body>
    <h1>Aegis Test Backend: {server}</h1>
    <div class="info">
        <p><strong>Server:</strong> {server}</p>
        <p><strong>Path:</strong> {path}</p>
        <p><strong>Time:</strong> {timestamp}</p>
    </div>
    <h2>Endpoints:</h2>
    <ul>
        <li><a href="/health">/health</a> - Health check endpoint</li>
        <li><a href="/api/test">/api/test</a> - API test endpoint</li>
    </ul>
</body>
</html>"#,
            server = self.server,
            path = self.path,
            timestamp = self.timestamp,
        )
    }
}

/// One of the three canned responses
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    Health(HealthResponse),
    Api(ApiResponse),
    Default(DefaultResponse),
}

impl BackendResponse {
    /// Every canned response is a success
    pub fn status(&self) -> StatusCode {
        StatusCode::OK
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            BackendResponse::Health(_) | BackendResponse::Api(_) => "application/json",
            BackendResponse::Default(_) => "text/html",
        }
    }

    /// Serialize the body; JSON bodies use two-space indentation
    pub fn body(&self) -> Result<String, serde_json::Error> {
        match self {
            BackendResponse::Health(health) => serde_json::to_string_pretty(health),
            BackendResponse::Api(api) => serde_json::to_string_pretty(api),
            BackendResponse::Default(page) => Ok(page.html()),
        }
    }

    /// Value for the `X-Backend-Server` header, only set on API responses
    pub fn backend_server(&self) -> Option<&str> {
        match self {
            BackendResponse::Api(api) => Some(&api.server),
            _ => None,
        }
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        let body = match self.body() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        };

        let mut response = (
            self.status(),
            [(CONTENT_TYPE, HeaderValue::from_static(self.content_type()))],
            body,
        )
            .into_response();

        if let Some(server) = self.backend_server() {
            match HeaderValue::from_str(server) {
                Ok(value) => {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static(BACKEND_SERVER_HEADER), value);
                }
                Err(e) => {
                    tracing::warn!(server, error = %e, "Server name is not a valid header value");
                }
            }
        }

        response
    }
}
