//! Authenticated-flag derivation.

use axum::{
    extract::Request,
    http::Extensions,
    middleware::Next,
    response::Response,
};
use futures_util::future::BoxFuture;

use super::Interceptor;
use crate::error::AppError;
use crate::http::response::ErrorReporter;
use crate::session::VisitorSession;

/// Request-scoped marker: the session holds an authenticated user.
///
/// Never persisted; derived again on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsAuthenticated;

pub fn is_authenticated(extensions: &Extensions) -> bool {
    extensions.get::<IsAuthenticated>().is_some()
}

/// Sets [`IsAuthenticated`] when the session carries a user id.
///
/// This is the only place that turns session contents into a login decision.
/// The session is trusted as is; the backend is not consulted.
#[derive(Debug, Clone)]
pub struct Authenticate {
    reporter: ErrorReporter,
}

impl Authenticate {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self { reporter }
    }
}

impl Interceptor for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn handle(&self, mut request: Request, next: Next) -> BoxFuture<'static, Response> {
        let reporter = self.reporter.clone();
        Box::pin(async move {
            let session = match VisitorSession::from_extensions(request.extensions()) {
                Ok(session) => session,
                Err(e) => return reporter.server_error(&e),
            };

            match session.is_logged_in().await {
                Ok(true) => {
                    request.extensions_mut().insert(IsAuthenticated);
                }
                Ok(false) => {}
                Err(e) => return reporter.server_error(&AppError::from(e)),
            }

            next.run(request).await
        })
    }
}
