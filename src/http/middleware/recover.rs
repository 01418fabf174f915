//! Panic containment.

use axum::{
    extract::Request,
    http::{header::CONNECTION, HeaderValue},
    middleware::Next,
    response::Response,
};
use futures_util::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;

use super::Interceptor;
use crate::error::AppError;
use crate::http::response::ErrorReporter;

/// Turns a panic anywhere downstream into a server error.
///
/// The response carries `Connection: close` so the connection is not reused.
#[derive(Debug, Clone)]
pub struct RecoverPanic {
    reporter: ErrorReporter,
}

impl RecoverPanic {
    pub fn new(reporter: ErrorReporter) -> Self {
        Self { reporter }
    }
}

impl Interceptor for RecoverPanic {
    fn name(&self) -> &'static str {
        "recover_panic"
    }

    fn handle(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        let reporter = self.reporter.clone();
        Box::pin(async move {
            match AssertUnwindSafe(next.run(request)).catch_unwind().await {
                Ok(response) => response,
                Err(payload) => {
                    let error = AppError::Panic(panic_message(payload.as_ref()));
                    let mut response = reporter.server_error(&error);
                    response
                        .headers_mut()
                        .insert(CONNECTION, HeaderValue::from_static("close"));
                    response
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
