pub mod models;
pub mod routes;
pub mod server;

pub use models::{ApiResponse, BackendResponse, DefaultResponse, HealthResponse};
pub use routes::{BackendState, RouteKind};
pub use server::{run_http_backend, run_http_backend_until, HttpBackend};
