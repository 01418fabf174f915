//! Login gate for individual routes.

use axum::{
    extract::Request,
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use futures_util::future::BoxFuture;

use super::{is_authenticated, Interceptor};
use crate::error::AppError;
use crate::http::response::ErrorReporter;
use crate::session::{VisitorSession, REDIRECT_PATH_AFTER_LOGIN};

pub const LOGIN_PATH: &str = "/user/login";

/// Sends anonymous visitors to the login page, remembering where they were going.
///
/// Responses for logged in visitors get `Cache-Control: no-store`.
#[derive(Debug, Clone)]
pub struct RequireAuthentication {
    reporter: ErrorReporter,
}

impl RequireAuthentication {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self { reporter }
    }
}

impl Interceptor for RequireAuthentication {
    fn name(&self) -> &'static str {
        "require_authentication"
    }

    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        let reporter = self.reporter.clone();
        Box::pin(async move {
            if !is_authenticated(request.extensions()) {
                let session = match VisitorSession::from_extensions(request.extensions()) {
                    Ok(session) => session,
                    Err(e) => return reporter.server_error(&e),
                };
                let path = request.uri().path();
                if let Err(e) = session.put(REDIRECT_PATH_AFTER_LOGIN, path).await {
                    return reporter.server_error(&AppError::from(e));
                }
                tracing::debug!(path, "Login required");
                return Redirect::to(LOGIN_PATH).into_response();
            }

            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        })
    }
}
