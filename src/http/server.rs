//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every page handler
//! - Wire up the interceptor chains and transport middleware (request ID, tracing, timeout)
//! - Bind the listener, plain or TLS
//! - Drain in-flight requests on shutdown

use axum::{
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{BackendClient, BackendError, VisitorClient};
use crate::config::validation::decode_session_secret;
use crate::config::{AppConfig, ValidationError};
use crate::error::AppError;
use crate::http::middleware::{
    AccessLog, Authenticate, Chain, Csrf, Interceptor, RecoverPanic, RequireAuthentication,
    SecureHeaders,
};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::ErrorReporter;
use crate::http::{health, pages, user};
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;
use crate::session::{self, SessionKeyError};
use crate::views::{PageContext, TemplateData, ViewError, Views};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ValidationError),
    #[error(transparent)]
    SessionKey(#[from] SessionKeyError),
    #[error("failed to load templates")]
    Views(#[from] ViewError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("invalid listen address `{0}`")]
    Address(String),
    #[error("server I/O error")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub views: Arc<Views>,
    pub reporter: ErrorReporter,
}

impl AppState {
    /// Backend client acting for the visitor behind `ctx`.
    pub async fn backend_for(&self, ctx: &PageContext) -> Result<VisitorClient<'_>, AppError> {
        let bearer = ctx.session.bearer_token().await?;
        Ok(self.backend.on_behalf_of(bearer, ctx.request_id.0.clone()))
    }

    pub async fn render(
        &self,
        ctx: &PageContext,
        page: &str,
        data: TemplateData,
    ) -> Result<Response, AppError> {
        let data = ctx.fill(data).await?;
        let html = self.views.render(page, &data)?;
        Ok(Html(html).into_response())
    }

    /// Turn a handler outcome into a response, reporting failures.
    pub fn finish(&self, result: Result<Response, AppError>) -> Response {
        result.unwrap_or_else(|e| self.reporter.server_error(&e))
    }
}

/// HTTP server for the storefront.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, shutdown: Shutdown) -> Result<Self, ServerError> {
        let secret = decode_session_secret(&config.web.session_secret)?;
        let session = session::session_context(&config.web, &secret)?;
        let views = Views::load(&config.web.templates_dir)?;
        let backend = BackendClient::new(&config.backend)?;
        let reporter = ErrorReporter::from_config(&config.web, shutdown.clone());

        tracing::info!(
            backend = %backend.base_url(),
            pages = views.pages().count(),
            "Storefront assembled"
        );

        let state = AppState {
            backend,
            views: Arc::new(views),
            reporter,
        };

        let router = Self::build_router(&config, state, session);
        Ok(Self {
            router,
            config,
            shutdown,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, session: Arc<dyn Interceptor>) -> Router {
        let reporter = state.reporter.clone();

        let mut standard = Chain::new()
            .with(RecoverPanic::new(reporter.clone()))
            .with(AccessLog);
        if config.security.enable_headers {
            standard = standard.with(SecureHeaders);
        }

        let dynamic = Chain::new()
            .with_shared(session)
            .with(Csrf::new(
                config.web.csrf_exempt_paths.iter().cloned(),
                config.security.max_body_size,
                reporter.clone(),
            ))
            .with(Authenticate::new(reporter.clone()));
        let protected = dynamic.append(RequireAuthentication::new(reporter));

        tracing::debug!(standard = ?standard, dynamic = ?dynamic, protected = ?protected, "Interceptor chains");

        let routes = Router::new()
            .route("/", protected.then(get(pages::home)))
            .route("/about", dynamic.then(get(pages::about)))
            .route("/product/{id}", protected.then(get(pages::show_product)))
            .route("/user/login", dynamic.then(get(user::login_form).post(user::login)))
            .route("/user/logout", protected.then(post(user::logout)))
            .route("/user/profile", protected.then(get(user::profile)))
            .route("/ping", get(health::ping))
            .nest_service("/static", ServeDir::new(&config.web.static_dir))
            .fallback(pages::not_found)
            .with_state(state);

        standard.wrap(routes).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(TimeoutLayer::new(config.web.request_timeout())),
        )
    }

    /// The fully assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown coordinator fires, then drain.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .web
            .host
            .parse()
            .map_err(|_| ServerError::Address(self.config.web.host.clone()))?;

        let handle = Handle::new();
        let grace = self.config.web.shutdown_timeout();
        let mut shutdown_rx = self.shutdown.subscribe();
        let drain = handle.clone();
        tokio::spawn(async move {
            if let Ok(reason) = shutdown_rx.recv().await {
                tracing::info!(reason = ?reason, grace = ?grace, "Draining connections");
                drain.graceful_shutdown(Some(grace));
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let idle = self.config.web.idle_timeout();

        match &self.config.web.tls {
            Some(tls) => {
                let rustls = load_tls_config(&tls.cert_path, &tls.key_path).await?;
                tracing::info!(address = %addr, idle = ?idle, "HTTPS server starting");
                let mut server = axum_server::bind_rustls(addr, rustls).handle(handle);
                limit_idle_connections(server.http_builder(), idle);
                server.serve(app).await?;
            }
            None => {
                tracing::info!(address = %addr, idle = ?idle, "HTTP server starting");
                let mut server = axum_server::bind(addr).handle(handle);
                limit_idle_connections(server.http_builder(), idle);
                server.serve(app).await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Close connections that have not sent request headers within `idle`.
///
/// Applies both to slow first requests and to kept-alive connections
/// waiting for their next request.
fn limit_idle_connections(builder: &mut ConnectionBuilder<TokioExecutor>, idle: Duration) {
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(idle);
}
