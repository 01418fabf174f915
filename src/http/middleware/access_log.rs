//! Access logging.

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use futures_util::future::BoxFuture;
use std::net::SocketAddr;
use std::time::Instant;

use super::Interceptor;
use crate::http::request::RequestId;
use crate::observability::metrics;

/// Logs each request line and records request metrics once answered.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl Interceptor for AccessLog {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().clone();
            let remote = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_else(|| "-".to_string());
            let request_id = RequestId::from_headers(request.headers());

            tracing::info!(
                request_id = %request_id.as_str(),
                remote = %remote,
                version = ?request.version(),
                method = %method,
                uri = %request.uri(),
                "Request"
            );

            let response = next.run(request).await;
            metrics::record_request(method.as_str(), response.status().as_u16(), start);

            tracing::debug!(
                request_id = %request_id.as_str(),
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "Response"
            );
            response
        })
    }
}
