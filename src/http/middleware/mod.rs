//! Interceptor chain.
//!
//! # Data Flow
//! ```text
//! Outer chain (every route, static assets and /ping included):
//!     RecoverPanic → AccessLog → SecureHeaders
//!
//! Dynamic pages, on top of the outer chain:
//!     SessionContext → Csrf → Authenticate
//!
//! Pages that need a logged in visitor, appended per route:
//!     … → RequireAuthentication
//! ```
//!
//! Interceptors run in the order they were added. Each one either answers
//! the request itself or hands it to `next`.

pub mod access_log;
pub mod authenticate;
pub mod csrf;
pub mod recover;
pub mod require_auth;
pub mod secure_headers;
pub mod session_context;

use axum::{
    extract::Request,
    middleware::{from_fn, Next},
    response::Response,
    routing::MethodRouter,
    Router,
};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

pub use access_log::AccessLog;
pub use authenticate::{is_authenticated, Authenticate, IsAuthenticated};
pub use csrf::{Csrf, CsrfToken, X_CSRF_TOKEN};
pub use recover::RecoverPanic;
pub use require_auth::RequireAuthentication;
pub use secure_headers::SecureHeaders;
pub use session_context::SessionContext;

/// One step of request processing.
pub trait Interceptor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Answer the request or pass it on with `next.run(request)`.
    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response>;
}

/// Ordered list of interceptors.
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, interceptor: impl Interceptor) -> Self {
        self.with_shared(Arc::new(interceptor))
    }

    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// A new chain with `interceptor` after everything in `self`.
    pub fn append(&self, interceptor: impl Interceptor) -> Self {
        self.clone().with(interceptor)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Run every route of `router` through the chain.
    pub fn wrap<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // Layers added last run first, so fold from the back.
        self.interceptors.iter().rev().fold(router, |router, interceptor| {
            let interceptor = Arc::clone(interceptor);
            router.layer(from_fn(move |request: Request, next: Next| {
                interceptor.handle(request, next)
            }))
        })
    }

    /// Run a single route through the chain.
    pub fn then<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.interceptors.iter().rev().fold(route, |route, interceptor| {
            let interceptor = Arc::clone(interceptor);
            route.layer(from_fn(move |request: Request, next: Next| {
                interceptor.handle(request, next)
            }))
        })
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse, routing::get};
    use std::sync::Mutex;
    use tower::ServiceExt;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Record {
        label: &'static str,
        log: Log,
    }

    impl Interceptor for Record {
        fn name(&self) -> &'static str {
            self.label
        }

        fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
            let label = self.label;
            let log = self.log.clone();
            Box::pin(async move {
                log.lock().unwrap().push(format!("{label}:before"));
                let response = next.run(request).await;
                log.lock().unwrap().push(format!("{label}:after"));
                response
            })
        }
    }

    struct Teapot;

    impl Interceptor for Teapot {
        fn name(&self) -> &'static str {
            "teapot"
        }

        fn handle(&self, _request: Request, _next: Next) -> BoxFuture<'static, Response> {
            Box::pin(async { StatusCode::IM_A_TEAPOT.into_response() })
        }
    }

    fn record(label: &'static str, log: &Log) -> Record {
        Record {
            label,
            log: log.clone(),
        }
    }

    fn logging_handler(log: &Log) -> MethodRouter {
        let log = log.clone();
        get(move || async move {
            log.lock().unwrap().push("handler".to_string());
            "done"
        })
    }

    async fn call(router: Router) -> StatusCode {
        let request = axum::http::Request::get("/").body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn first_added_runs_outermost() {
        let log: Log = Arc::default();
        let outer = Chain::new().with(record("a", &log)).with(record("b", &log));
        let inner = Chain::new().with(record("c", &log));

        let router = outer.wrap(Router::new().route("/", inner.then(logging_handler(&log))));
        assert_eq!(call(router).await, StatusCode::OK);

        assert_eq!(
            *log.lock().unwrap(),
            [
                "a:before", "b:before", "c:before", "handler", "c:after", "b:after", "a:after"
            ]
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let log: Log = Arc::default();
        let chain = Chain::new()
            .with(record("a", &log))
            .with(Teapot)
            .with(record("never", &log));

        let router = Router::new().route("/", chain.then(logging_handler(&log)));
        assert_eq!(call(router).await, StatusCode::IM_A_TEAPOT);
        assert_eq!(*log.lock().unwrap(), ["a:before", "a:after"]);
    }

    #[test]
    fn append_leaves_original_untouched() {
        let log: Log = Arc::default();
        let base = Chain::new().with(record("a", &log));
        let extended = base.append(Teapot);

        assert_eq!(base.names(), ["a"]);
        assert_eq!(extended.names(), ["a", "teapot"]);
        assert_eq!(format!("{extended:?}"), r#"["a", "teapot"]"#);
    }
}
