use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use axum::Router;

use crate::config::{HttpBackendConfig, ServerIdentity};
use crate::error::BackendError;
use crate::http_backend::routes::{dispatch, BackendState};
use crate::logging::{banner, print_banner, ConsoleLog};
use crate::utils::shutdown_signal;

/// HTTP test backend bound to a listening socket
pub struct HttpBackend {
    listener: TcpListener,
    state: Arc<BackendState>,
}

impl HttpBackend {
    /// Bind the listener. Nothing is served until [`HttpBackend::serve`].
    pub fn bind(
        addr: SocketAddr,
        identity: ServerIdentity,
        log: Arc<dyn ConsoleLog>,
    ) -> Result<Self, BackendError> {
        let listener =
            TcpListener::bind(addr).map_err(|source| BackendError::BindError { addr, source })?;
        listener.set_nonblocking(true)?;

        tracing::info!(%addr, server = %identity, "HTTP backend bound");

        Ok(Self {
            listener,
            state: Arc::new(BackendState::new(identity, log)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BackendError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> Arc<BackendState> {
        self.state.clone()
    }

    /// Router sending every request to the path-based dispatcher
    pub fn router(state: Arc<BackendState>) -> Router {
        Router::new().fallback(dispatch).with_state(state)
    }

    /// Serve requests until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<(), BackendError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = Self::router(self.state);

        axum::Server::from_tcp(self.listener)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// Run the HTTP test backend until Ctrl+C
pub async fn run_http_backend(
    config: HttpBackendConfig,
    log: Arc<dyn ConsoleLog>,
) -> Result<(), BackendError> {
    run_http_backend_until(config, log, shutdown_signal()).await
}

/// Run the HTTP test backend until `shutdown` resolves, printing the banner
/// on startup and the shutdown lines on the way out
pub async fn run_http_backend_until<F>(
    config: HttpBackendConfig,
    log: Arc<dyn ConsoleLog>,
    shutdown: F,
) -> Result<(), BackendError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let identity = config.identity()?;
    let addr = config.socket_addr()?;

    let backend = HttpBackend::bind(addr, identity, log.clone())?;
    let bound = backend.local_addr()?;

    let lines = banner(
        "Aegis Test Backend Server",
        &config.name,
        &bound.ip().to_string(),
        bound.port(),
    );
    print_banner(log.as_ref(), &lines, "Server is ready to accept connections.");

    backend.serve(shutdown).await?;

    log.line("\n\nShutting down server...");
    log.line("Server stopped.");
    tracing::info!("HTTP backend stopped");

    Ok(())
}
