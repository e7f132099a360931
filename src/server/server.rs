//! HTTP server core implementation
//!
//! Owns the listening socket lifecycle: the accept loop runs in a
//! background task while the foreground waits on a first-wins race between
//! a fatal serve error and the shutdown trigger. Shutdown drains in-flight
//! requests bounded by the configured grace period.

use crate::config::Config;
use crate::server::middleware::{AccessLogMiddleware, RecoveryMiddleware};
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{Result, ServiceError};
use actix_web::{App, HttpServer as ActixHttpServer, web};
use bytes::Bytes;
use std::future::Future;
use std::time::Instant;
use tokio::signal;
use tracing::info;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: Config,
    /// Embedded OpenAPI document, passed through to the handler
    openapi: Bytes,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: Config, openapi: Bytes) -> Self {
        Self { config, openapi }
    }

    /// Create the Actix-web application
    ///
    /// The single source of truth for the route table. Middleware runs in
    /// reverse registration order: the access log observes the recovery
    /// layer's output, so contained failures are logged with their final
    /// status.
    pub(crate) fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(state)
            .wrap(RecoveryMiddleware)
            .wrap(AccessLogMiddleware)
            .configure(routes::health::configure_routes)
            .configure(routes::openapi::configure_routes)
            .configure(routes::debug::configure_routes)
    }

    /// Run the server until SIGINT or SIGTERM
    pub async fn start(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves, then drain gracefully.
    ///
    /// Returns early with a server error if the listener cannot bind or the
    /// accept loop fails; no grace period is attempted in that case.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let bind_addr = self.config.bind_addr();
        let grace = self.config.shutdown_timeout;
        let state = web::Data::new(AppState::new(self.config.clone(), self.openapi.clone()));

        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .bind(&bind_addr)
            .map_err(|e| ServiceError::server(format!("bind {}: {}", bind_addr, e)))?
            .shutdown_timeout(grace.as_secs())
            .disable_signals()
            .run();

        let handle = server.handle();
        let mut serving = tokio::spawn(server);

        info!(addr = %bind_addr, "server started");

        tokio::select! {
            // Fatal serve error before any shutdown was requested
            res = &mut serving => match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(ServiceError::server(e)),
                Err(e) => Err(ServiceError::server(e)),
            },
            _ = shutdown => {
                info!("shutting down server");

                // stop(true) force-closes connections still open once the
                // configured shutdown timeout expires and then resolves
                // cleanly, so an overrun has to be detected by timing the
                // drain itself
                let draining = Instant::now();
                handle.stop(true).await;
                if draining.elapsed() >= grace {
                    return Err(ServiceError::shutdown("grace period exceeded"));
                }

                match serving.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(ServiceError::shutdown(e)),
                    Err(e) => Err(ServiceError::shutdown(e)),
                }
            }
        }
    }
}

/// Resolve when SIGINT or SIGTERM is delivered; other signals are not
/// handled here.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
