//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the reflector and health handlers
//! - Wire up middleware (tracing, panics, limits, timeouts, response headers)
//! - Serve plain HTTP or TLS with graceful shutdown
//! - Apply hot-reloaded reflector settings

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    routing::get,
    Extension, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;
use uuid::Uuid;

use crate::config::{ReflectorConfig, ServiceConfig};
use crate::http::headers::{health, reflect_headers};
use crate::http::response::panic_response;
use crate::reflector::TransportScheme;

/// Path of the reflector endpoint.
pub const HEADERS_PATH: &str = "/api/headers";

/// Grace period for in-flight TLS connections on shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current reflector settings, swapped on config reload.
    pub reflector: Arc<ArcSwap<ReflectorConfig>>,
}

/// HTTP server for the header reflector.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    reflector: Arc<ArcSwap<ReflectorConfig>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let reflector = Arc::new(ArcSwap::from_pointee(config.reflector.clone()));
        let state = AppState {
            reflector: reflector.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            reflector,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let scheme = if config.listener.tls.is_some() {
            TransportScheme::Https
        } else {
            TransportScheme::Http
        };

        let mut router = Router::new()
            .route(HEADERS_PATH, get(reflect_headers))
            .route("/health", get(health))
            .with_state(state)
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ));

        if config.security.enable_headers {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }

        router
            .layer(Extension(scheme))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
    }

    /// Run the server, accepting plain HTTP connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reloader = spawn_reloader(self.reflector.clone(), config_updates);
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        result
    }

    /// Run the server terminating TLS on the given (non-blocking) listener.
    pub async fn run_tls(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let reloader = spawn_reloader(self.reflector.clone(), config_updates);
        let handle = axum_server::Handle::new();

        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(app)
            .await;

        reloader.abort();
        tracing::info!("HTTPS server stopped");
        result
    }

    /// The router with all layers applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Swap in the reflector settings of every config update.
fn spawn_reloader(
    reflector: Arc<ArcSwap<ReflectorConfig>>,
    mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(config) = config_updates.recv().await {
            if **reflector.load() == config.reflector {
                continue;
            }
            tracing::info!(
                trust_proxy_headers = config.reflector.trust_proxy_headers,
                server_name = %config.reflector.server_name,
                "Reflector settings reloaded"
            );
            reflector.store(Arc::new(config.reflector));
        }
    })
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        uuid = %Uuid::new_v4(),
        method = %request.method(),
        uri = %request.uri(),
    )
}
