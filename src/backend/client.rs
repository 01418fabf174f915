//! Outbound calls to the backend API.
//!
//! Every call is bounded by the configured timeout. Requests made on behalf
//! of a visitor carry that visitor's bearer token when the session holds one,
//! and the inbound request ID for correlation.

use axum::http::{HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Instant;
use uuid::Uuid;

use crate::backend::models::{Product, TokenResponse, User};
use crate::backend::BackendError;
use crate::config::BackendConfig;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;

/// Outcome of a backend call that reached the backend.
///
/// Mapping non-200 statuses onto browser responses is left to each handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Ok(T),
    Status(StatusCode),
}

/// Shared HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(BackendError::Build)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Scope the client to one visitor's credentials.
    pub fn on_behalf_of(
        &self,
        bearer: Option<String>,
        request_id: Option<HeaderValue>,
    ) -> VisitorClient<'_> {
        VisitorClient {
            backend: self,
            bearer,
            request_id,
        }
    }
}

/// Backend client bound to the current visitor.
#[derive(Debug)]
pub struct VisitorClient<'a> {
    backend: &'a BackendClient,
    bearer: Option<String>,
    request_id: Option<HeaderValue>,
}

impl VisitorClient<'_> {
    /// Build a GET request carrying the visitor's bearer token, if any.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.unauthenticated(path);
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn unauthenticated(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.backend.http.get(self.backend.url(path));
        match &self.request_id {
            Some(id) => request.header(X_REQUEST_ID, id.clone()),
            None => request,
        }
    }

    /// Build the credential exchange request.
    ///
    /// Basic auth takes the place of any bearer token the visitor holds.
    pub fn token_request(&self, email: &str, password: &str) -> reqwest::RequestBuilder {
        self.unauthenticated("/users/token")
            .basic_auth(email, Some(password))
    }

    pub async fn products(&self) -> Result<Reply<Vec<Product>>, BackendError> {
        self.fetch("products", self.get("/products")).await
    }

    pub async fn product(&self, id: &Uuid) -> Result<Reply<Product>, BackendError> {
        self.fetch("product", self.get(&format!("/products/{id}"))).await
    }

    pub async fn user(&self, id: &str) -> Result<Reply<User>, BackendError> {
        self.fetch("user", self.get(&format!("/users/{id}"))).await
    }

    /// Exchange credentials for a token.
    pub async fn token(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Reply<TokenResponse>, BackendError> {
        self.fetch("token", self.token_request(email, password)).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Reply<T>, BackendError> {
        let start = Instant::now();
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                metrics::record_backend_call(endpoint, "error", start);
                return Err(BackendError::Transport { endpoint, source: e });
            }
        };

        let status = response.status();
        metrics::record_backend_call(endpoint, status.as_str(), start);
        tracing::debug!(endpoint, status = %status, elapsed = ?start.elapsed(), "Backend call");

        if status != StatusCode::OK {
            return Ok(Reply::Status(status));
        }

        response
            .json::<T>()
            .await
            .map(Reply::Ok)
            .map_err(|e| BackendError::Decode { endpoint, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: "http://backend.test/v1/".into(),
            timeout_ms: 1000,
        })
        .unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(client().base_url(), "http://backend.test/v1");
    }

    #[test]
    fn bearer_attached_only_when_present() {
        let backend = client();

        let anonymous = backend.on_behalf_of(None, None).get("/products").build().unwrap();
        assert!(anonymous.headers().get(AUTHORIZATION).is_none());
        assert_eq!(anonymous.url().as_str(), "http://backend.test/v1/products");

        let visitor = backend
            .on_behalf_of(Some("abc.def.ghi".into()), Some(HeaderValue::from_static("req-1")))
            .get("/products");
        let request = visitor.build().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc.def.ghi");
        assert_eq!(request.headers()[X_REQUEST_ID], "req-1");
    }

    #[test]
    fn token_request_uses_basic_auth() {
        let backend = client();
        let request = backend
            .on_behalf_of(Some("stale".into()), None)
            .token_request("user@example.com", "gophers")
            .build()
            .unwrap();

        let values: Vec<_> = request.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert!(values[0].to_str().unwrap().starts_with("Basic "));
    }
}
