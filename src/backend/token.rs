//! Structural parsing of the login token.
//!
//! The backend signs its tokens; the storefront only reads the subject claim
//! and never checks the signature. Trust comes from the transport to the
//! backend, and the raw token is sent back to the backend as a bearer
//! credential where it *is* verified.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token does not have three segments")]
    Segments,
    #[error("token payload is not base64url")]
    Encoding,
    #[error("token payload is not a JSON claims object")]
    Claims,
    #[error("token has no subject claim")]
    MissingSubject,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
}

/// Extract the `sub` claim from a compact JWT without verifying it.
pub fn unverified_subject(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Segments);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Claims)?;

    match claims.sub {
        Some(sub) if !sub.is_empty() => Ok(sub),
        _ => Err(TokenError::MissingSubject),
    }
}
