//! Security response headers.

use axum::{
    extract::Request,
    http::{header::X_FRAME_OPTIONS, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use futures_util::future::BoxFuture;

use super::Interceptor;

const X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");

#[derive(Debug, Clone, Copy, Default)]
pub struct SecureHeaders;

impl Interceptor for SecureHeaders {
    fn name(&self) -> &'static str {
        "secure_headers"
    }

    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
            headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
            response
        })
    }
}
