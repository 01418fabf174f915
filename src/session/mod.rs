//! Per-visitor session state.
//!
//! # Data Flow
//! ```text
//! Cookie `session` (private: encrypted + authenticated)
//!     → SessionManagerLayer (tower-sessions, in-memory store)
//!     → tower_sessions::Session in request extensions
//!     → VisitorSession (typed keys, domain helpers)
//! ```
//!
//! Presence of [`AUTHENTICATED_USER_ID`] is the only signal that a visitor is
//! logged in. The `Authenticate` interceptor is the one place that reads it for
//! that purpose; everything downstream consults the request-scoped flag.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Extensions, StatusCode};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::session::Error as StoreError;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::WebConfig;
use crate::error::AppError;
use crate::http::middleware::{Interceptor, SessionContext};

pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
pub const JSON_WEB_TOKEN: &str = "jsonWebToken";
pub const FLASH: &str = "flash";
pub const REDIRECT_PATH_AFTER_LOGIN: &str = "redirectPathAfterLogin";
pub const CSRF_TOKEN: &str = "csrfToken";

pub const SESSION_COOKIE: &str = "session";

/// Random bytes behind each CSRF token.
const CSRF_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
#[error("session key must be at least 64 bytes, got {0}")]
pub struct SessionKeyError(pub usize);

/// Build the interceptor that loads and saves sessions around each request.
pub fn session_context(
    config: &WebConfig,
    secret: &[u8],
) -> Result<Arc<dyn Interceptor>, SessionKeyError> {
    let key = Key::try_from(secret).map_err(|_| SessionKeyError(secret.len()))?;
    let lifetime = time::Duration::seconds(config.session_lifetime_secs as i64);

    let layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Strict)
        .with_expiry(Expiry::OnInactivity(lifetime))
        .with_private(key);

    Ok(Arc::new(SessionContext::new(layer)))
}

/// Typed view over a visitor's session.
#[derive(Debug, Clone)]
pub struct VisitorSession(Session);

impl VisitorSession {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    pub fn from_extensions(extensions: &Extensions) -> Result<Self, AppError> {
        extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or(AppError::MissingSession)
    }

    /// String value under `key`; empty strings read as absent.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.get::<String>(key).await?.filter(|v| !v.is_empty()))
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.insert(key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.0.remove_value(key).await.map(|_| ())
    }

    /// Read and delete in one step.
    pub async fn pop_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.0.remove::<String>(key).await?.filter(|v| !v.is_empty()))
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.0.get_value(key).await?.is_some())
    }

    pub async fn is_logged_in(&self) -> Result<bool, StoreError> {
        self.exists(AUTHENTICATED_USER_ID).await
    }

    pub async fn authenticated_user_id(&self) -> Result<Option<String>, StoreError> {
        self.get_string(AUTHENTICATED_USER_ID).await
    }

    pub async fn bearer_token(&self) -> Result<Option<String>, StoreError> {
        self.get_string(JSON_WEB_TOKEN).await
    }

    /// Move the visitor to the authenticated state.
    ///
    /// The session id is rotated first so a pre-login cookie cannot ride along.
    pub async fn log_in(&self, user_id: &str, token: &str) -> Result<(), StoreError> {
        self.0.cycle_id().await?;
        self.put(AUTHENTICATED_USER_ID, user_id).await?;
        self.put(JSON_WEB_TOKEN, token).await
    }

    /// Drop the authenticated state and leave a one-time message.
    ///
    /// The backend token is forgotten locally; it is not revoked.
    pub async fn log_out(&self, flash: &str) -> Result<(), StoreError> {
        self.remove(AUTHENTICATED_USER_ID).await?;
        self.remove(JSON_WEB_TOKEN).await?;
        self.put(FLASH, flash).await
    }

    /// The session's CSRF token, minted on first use.
    pub async fn csrf_token(&self) -> Result<String, StoreError> {
        if let Some(token) = self.get_string(CSRF_TOKEN).await? {
            return Ok(token);
        }
        let token = new_csrf_token();
        self.put(CSRF_TOKEN, &token).await?;
        Ok(token)
    }
}

fn new_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl<S: Send + Sync> FromRequestParts<S> for VisitorSession {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_extensions(&parts.extensions).map_err(|e| {
            tracing::error!(error = %e, path = %parts.uri.path(), "No session on request");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        })
    }
}
