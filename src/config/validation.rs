//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that only make sense
//! together (addresses parse, secrets have the right length, TLS files are
//! named when TLS is on). All problems are reported, not just the first.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// Decoded length of the session key material.
pub const SESSION_SECRET_LEN: usize = 64;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("web.host {0:?} is not a socket address")]
    InvalidHost(String),
    #[error("web.session_secret is not valid base64")]
    SecretNotBase64,
    #[error("web.session_secret must decode to exactly {SESSION_SECRET_LEN} bytes (got {0})")]
    SecretLength(usize),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("web.tls.{0} must not be empty")]
    MissingTlsPath(&'static str),
    #[error("backend.base_url {0:?} is not an http(s) URL")]
    InvalidBaseUrl(String),
    #[error("web.csrf_exempt_paths entry {0:?} must start with '/'")]
    RelativeExemptPath(String),
    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.web.host.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(config.web.host.clone()));
    }

    match decode_session_secret(&config.web.session_secret) {
        Ok(_) => {}
        Err(e) => errors.push(e),
    }

    let durations = [
        ("web.session_lifetime_secs", config.web.session_lifetime_secs),
        ("web.request_timeout_secs", config.web.request_timeout_secs),
        ("web.idle_timeout_secs", config.web.idle_timeout_secs),
        ("backend.timeout_ms", config.backend.timeout_ms),
    ];
    for (name, value) in durations {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(name));
        }
    }

    if let Some(tls) = &config.web.tls {
        if tls.cert_path.as_os_str().is_empty() {
            errors.push(ValidationError::MissingTlsPath("cert_path"));
        }
        if tls.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::MissingTlsPath("key_path"));
        }
    }

    for path in &config.web.csrf_exempt_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeExemptPath(path.clone()));
        }
    }

    let base_ok = Url::parse(&config.backend.base_url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !base_ok {
        errors.push(ValidationError::InvalidBaseUrl(config.backend.base_url.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Decode the base64 session secret into raw key bytes.
pub fn decode_session_secret(secret: &str) -> Result<Vec<u8>, ValidationError> {
    let decoded = STANDARD
        .decode(secret.trim())
        .map_err(|_| ValidationError::SecretNotBase64)?;
    if decoded.len() != SESSION_SECRET_LEN {
        return Err(ValidationError::SecretLength(decoded.len()));
    }
    Ok(decoded)
}
