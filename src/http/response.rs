//! Error responses.
//!
//! # Responsibilities
//! - Map internal failures to a logged 500 with a diagnostic trace
//! - Map client errors to their status with the canonical reason as body
//! - Optionally stop the process after a server error
//!
//! # Design Decisions
//! - The trace goes to the browser only in debug mode
//! - Debug mode never triggers fail-fast shutdown

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Write;

use crate::config::WebConfig;
use crate::lifecycle::{Shutdown, ShutdownReason};

#[derive(Debug, Clone)]
pub struct ErrorReporter {
    debug: bool,
    shutdown: Option<Shutdown>,
}

impl ErrorReporter {
    /// `shutdown` is triggered after each server error when set.
    pub fn new(debug: bool, shutdown: Option<Shutdown>) -> Self {
        Self { debug, shutdown }
    }

    pub fn from_config(config: &WebConfig, shutdown: Shutdown) -> Self {
        let fail_fast = config.shutdown_on_server_error && !config.debug_mode;
        Self::new(config.debug_mode, fail_fast.then_some(shutdown))
    }

    pub fn server_error(&self, error: &(dyn Error + 'static)) -> Response {
        let trace = diagnostic_trace(error);
        tracing::error!(error = %error, trace = %trace, "Server error");

        if self.debug {
            return (StatusCode::INTERNAL_SERVER_ERROR, trace).into_response();
        }

        if let Some(shutdown) = &self.shutdown {
            tracing::warn!("Requesting shutdown after server error");
            shutdown.trigger(ShutdownReason::ServerError);
        }

        self.client_error(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn client_error(&self, status: StatusCode) -> Response {
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

/// Error message, its sources and the current backtrace.
fn diagnostic_trace(error: &(dyn Error + 'static)) -> String {
    let mut trace = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(trace, "\ncaused by: {cause}");
        source = cause.source();
    }
    let _ = write!(trace, "\n\n{}", Backtrace::force_capture());
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TokenError;
    use crate::error::AppError;

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn production_hides_details() {
        let reporter = ErrorReporter::new(false, None);
        let response = reporter.server_error(&AppError::from(TokenError::Segments));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn debug_shows_error_chain() {
        let reporter = ErrorReporter::new(true, None);
        let response = reporter.server_error(&AppError::from(TokenError::Segments));
        let text = body(response).await;
        assert!(text.starts_with("login token rejected\ncaused by: token does not have three segments"));
    }

    #[tokio::test]
    async fn fail_fast_triggers_shutdown() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let reporter = ErrorReporter::new(false, Some(shutdown));

        reporter.server_error(&AppError::MissingSession);
        assert_eq!(rx.recv().await.unwrap(), ShutdownReason::ServerError);
    }

    #[test]
    fn fail_fast_is_off_in_debug_mode() {
        let config = WebConfig {
            debug_mode: true,
            shutdown_on_server_error: true,
            ..Default::default()
        };
        let reporter = ErrorReporter::from_config(&config, Shutdown::new());
        assert!(reporter.shutdown.is_none());
    }

    #[tokio::test]
    async fn client_error_uses_reason_phrase() {
        let response = ErrorReporter::new(false, None).client_error(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(response).await, "Not Found");
    }
}
