//! Session attachment.

use axum::{extract::Request, middleware::Next, response::Response};
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use tower::{Layer, Service, ServiceExt};

use super::Interceptor;

/// Runs the rest of the chain inside a session layer.
///
/// The layer loads the visitor's session into the request extensions and
/// writes it back, with a refreshed cookie, on the way out.
#[derive(Debug, Clone)]
pub struct SessionContext<L> {
    layer: L,
}

impl<L> SessionContext<L> {
    pub fn new(layer: L) -> Self {
        Self { layer }
    }
}

impl<L> Interceptor for SessionContext<L>
where
    L: Layer<Next> + Send + Sync + 'static,
    L::Service: Service<Request, Response = Response, Error = Infallible> + Send + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    fn name(&self) -> &'static str {
        "session_context"
    }

    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        let service = self.layer.layer(next);
        Box::pin(async move {
            match service.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        })
    }
}
