//! Errors raised while handling a single request.
//!
//! Anything in here ends up at [`ErrorReporter::server_error`](crate::http::response::ErrorReporter)
//! as a 500. Client errors never become an `AppError`; handlers answer those directly.

use thiserror::Error;

use crate::backend::{BackendError, TokenError};
use crate::views::ViewError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("session store failure")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("login token rejected")]
    Token(#[from] TokenError),

    #[error("handler panicked: {0}")]
    Panic(String),

    #[error("session layer not installed for this route")]
    MissingSession,
}
