//! Backend API subsystem.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → client.rs (scoped to visitor: bearer token + request ID)
//!     → GET {base_url}/products | /products/{id} | /users/{id} | /users/token
//!     → models.rs (decode 200 JSON bodies)
//!     → Reply::Ok(T) | Reply::Status(code)
//!
//! Login:
//!     → token.rs (read `sub` from the issued token, unverified)
//! ```

pub mod client;
pub mod models;
pub mod token;

use thiserror::Error;

pub use client::{BackendClient, Reply, VisitorClient};
pub use models::{Product, TokenResponse, User};
pub use token::{unverified_subject, TokenError};

/// Failures talking to the backend that are not plain HTTP statuses.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build backend HTTP client")]
    Build(#[source] reqwest::Error),
    #[error("backend call `{endpoint}` failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend call `{endpoint}` returned an undecodable body")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}
