//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (request ID, trace span, timeout)
//!     → middleware/ (standard chain: recover, access log, secure headers)
//!     → middleware/ (dynamic chain: session, CSRF, authenticate [, require auth])
//!     → pages.rs / user.rs / health.rs (handlers, backend calls, rendering)
//!     → response.rs (error pages)
//!     → Send to client
//! ```

pub mod health;
pub mod middleware;
pub mod pages;
pub mod request;
pub mod response;
pub mod server;
pub mod user;

pub use request::{RequestId, UuidRequestId, X_REQUEST_ID};
pub use response::ErrorReporter;
pub use server::{AppState, HttpServer, ServerError};
