//! Data handed to templates.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use chrono::{Datelike, Utc};
use serde::Serialize;
use tower_sessions::session::Error as StoreError;

use crate::backend::{Product, User};
use crate::forms::Form;
use crate::http::middleware::{is_authenticated, CsrfToken};
use crate::http::request::RequestId;
use crate::session::{VisitorSession, FLASH};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateData {
    pub csrf_token: String,
    pub current_year: i32,
    pub flash: Option<String>,
    pub form: Option<Form>,
    pub is_authenticated: bool,
    pub products: Vec<Product>,
    pub product: Option<Product>,
    pub user: Option<User>,
    pub version: &'static str,
}

/// Per-request state every page needs.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub session: VisitorSession,
    pub csrf_token: CsrfToken,
    pub is_authenticated: bool,
    pub request_id: RequestId,
}

impl PageContext {
    /// Add the defaults every page shows. Consumes the flash message.
    pub async fn fill(&self, mut data: TemplateData) -> Result<TemplateData, StoreError> {
        data.csrf_token = self.csrf_token.0.clone();
        data.current_year = Utc::now().year();
        data.version = VERSION;
        data.flash = self.session.pop_string(FLASH).await?;
        data.is_authenticated = self.is_authenticated;
        Ok(data)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PageContext {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = VisitorSession::from_request_parts(parts, state).await?;
        Ok(Self {
            session,
            csrf_token: parts.extensions.get::<CsrfToken>().cloned().unwrap_or_default(),
            is_authenticated: is_authenticated(&parts.extensions),
            request_id: RequestId::from_headers(&parts.headers),
        })
    }
}
