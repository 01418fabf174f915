//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the storefront.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the storefront.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener, session and page settings.
    pub web: WebConfig,

    /// Backend API the storefront proxies to.
    pub backend: BackendConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Web front end configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address (e.g., "0.0.0.0:4200").
    pub host: String,

    /// Return full diagnostic traces to the browser on server errors.
    pub debug_mode: bool,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Base64 encoded key material for session cookies (64 bytes decoded).
    #[serde(skip_serializing)]
    pub session_secret: String,

    /// Session lifetime in seconds (inactivity based).
    pub session_lifetime_secs: u64,

    /// Set the Secure flag on session cookies.
    pub secure_cookies: bool,

    /// Total time allowed for one request/response in seconds.
    pub request_timeout_secs: u64,

    /// Longest wait for request headers in seconds, including the idle gap
    /// between requests on a kept-alive connection.
    pub idle_timeout_secs: u64,

    /// Grace period for in-flight requests on shutdown in seconds.
    pub shutdown_timeout_secs: u64,

    /// Stop the process after any server error (non-debug mode only).
    pub shutdown_on_server_error: bool,

    /// Directory holding `*.page.html`, `*.layout.html` and `*.partial.html`.
    pub templates_dir: PathBuf,

    /// Directory served under `/static`.
    pub static_dir: PathBuf,

    /// Paths that accept state-changing requests without a CSRF token.
    pub csrf_exempt_paths: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0:4200".to_string(),
            debug_mode: false,
            tls: None,
            session_secret: String::new(),
            session_lifetime_secs: 12 * 60 * 60,
            secure_cookies: true,
            request_timeout_secs: 5,
            idle_timeout_secs: 60,
            shutdown_timeout_secs: 5,
            shutdown_on_server_error: false,
            templates_dir: PathBuf::from("./ui/html"),
            static_dir: PathBuf::from("./ui/static"),
            csrf_exempt_paths: vec!["/ping".to_string(), "/about".to_string()],
        }
    }
}

impl WebConfig {
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL every API path is appended to.
    pub base_url: String,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://0.0.0.0:3000/v1".to_string(),
            timeout_ms: 1000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,
    /// Maximum form body size in bytes read for CSRF validation.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
