//! Cross-site request forgery protection.
//!
//! Every session owns one random token. Pages embed it as the hidden
//! `csrf_token` form field; scripts may send it as `X-CSRF-Token` instead.
//! State-changing requests must echo it back unless their path is exempt.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{
        header::CONTENT_TYPE, request::Parts, HeaderMap, HeaderName, Method, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use futures_util::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::Interceptor;
use crate::error::AppError;
use crate::http::response::ErrorReporter;
use crate::observability::metrics;
use crate::session::VisitorSession;

pub const X_CSRF_TOKEN: HeaderName = HeaderName::from_static("x-csrf-token");

/// Name of the hidden form field carrying the token.
pub const FORM_FIELD: &str = "csrf_token";

/// The current session's token, for embedding into pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrfToken(pub String);

#[derive(Debug, Clone)]
pub struct Csrf {
    exempt: Arc<HashSet<String>>,
    max_body_size: usize,
    reporter: ErrorReporter,
}

impl Csrf {
    pub fn new<I>(exempt_paths: I, max_body_size: usize, reporter: ErrorReporter) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            exempt: Arc::new(exempt_paths.into_iter().map(Into::into).collect()),
            max_body_size,
            reporter,
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.contains(path)
    }
}

impl Interceptor for Csrf {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn handle(&self, mut request: Request, next: Next) -> BoxFuture<'static, Response> {
        let this = self.clone();
        Box::pin(async move {
            let session = match VisitorSession::from_extensions(request.extensions()) {
                Ok(session) => session,
                Err(e) => return this.reporter.server_error(&e),
            };
            let expected = match session.csrf_token().await {
                Ok(token) => token,
                Err(e) => return this.reporter.server_error(&AppError::from(e)),
            };
            request.extensions_mut().insert(CsrfToken(expected.clone()));

            if is_safe(request.method()) || this.is_exempt(request.uri().path()) {
                return next.run(request).await;
            }

            let (parts, body) = request.into_parts();
            let bytes = match to_bytes(body, this.max_body_size).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to buffer request body");
                    return this.reject(&parts, "unreadable_body");
                }
            };

            let submitted = header_token(&parts.headers).or_else(|| form_token(&parts.headers, &bytes));
            match submitted {
                Some(token) if tokens_match(&token, &expected) => {
                    next.run(Request::from_parts(parts, Body::from(bytes))).await
                }
                Some(_) => this.reject(&parts, "mismatch"),
                None => this.reject(&parts, "missing"),
            }
        })
    }
}

impl Csrf {
    fn reject(&self, parts: &Parts, reason: &'static str) -> Response {
        tracing::warn!(
            reason,
            method = %parts.method,
            path = %parts.uri.path(),
            "CSRF check failed"
        );
        metrics::record_csrf_rejection(reason);
        self.reporter.client_error(StatusCode::BAD_REQUEST)
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_CSRF_TOKEN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn form_token(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return None;
    }

    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == FORM_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

fn tokens_match(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}
