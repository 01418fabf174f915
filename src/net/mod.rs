//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! web.tls set?
//!     yes → tls.rs (load PEM cert + key) → axum_server::bind_rustls
//!     no  → axum_server::bind
//! ```

pub mod tls;
