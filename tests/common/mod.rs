//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Path,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceExt;

use storefront::config::AppConfig;
use storefront::http::HttpServer;
use storefront::lifecycle::Shutdown;

pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "gophers";
pub const USER_ID: &str = "5cf37266-3473-4006-984f-9325122678b7";
pub const PRODUCT_ID: &str = "72f8b983-3eb4-48db-9ed0-e45cc6bd716b";
pub const PRODUCT_NAME: &str = "McDonalds Toys";

/// A compact JWT whose payload names [`USER_ID`]. The signature is junk.
pub fn fake_token() -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{USER_ID}","exp":4102444800}}"#))
    )
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == fake_token())
}

fn valid_basic(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .is_some_and(|decoded| decoded == format!("{EMAIL}:{PASSWORD}").as_bytes())
}

fn product() -> serde_json::Value {
    json!({
        "id": PRODUCT_ID,
        "name": PRODUCT_NAME,
        "cost": 75,
        "quantity": 120,
        "sold": 3,
        "revenue": 225,
        "user_id": USER_ID,
        "date_created": "2019-03-24T00:00:00Z",
        "date_updated": "2019-03-24T00:00:00Z"
    })
}

async fn products(headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([product()])).into_response()
}

async fn product_by_id(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != PRODUCT_ID {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(product()).into_response()
}

async fn token(headers: HeaderMap) -> Response {
    if !valid_basic(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "token": fake_token() })).into_response()
}

async fn user_by_id(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": id,
        "name": "User Gopher",
        "email": EMAIL,
        "date_created": "2019-03-24T00:00:00Z",
        "date_updated": "2019-03-24T00:00:00Z"
    }))
    .into_response()
}

/// Start a mock of the sales API on an ephemeral port.
pub async fn start_mock_backend() -> SocketAddr {
    let api = Router::new()
        .route("/products", get(products))
        .route("/products/{id}", get(product_by_id))
        .route("/users/token", get(token))
        .route("/users/{id}", get(user_by_id));
    let app = Router::new().nest("/v1", api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A sales API that issues tokens but rejects or garbles every other call.
///
/// `/products` answers 401, `/users/{id}` 403, and `/products/{id}` 200 with
/// a body that is not JSON for [`PRODUCT_ID`] and 401 for anything else.
pub async fn start_failing_backend() -> SocketAddr {
    let api = Router::new()
        .route("/products", get(|| async { StatusCode::UNAUTHORIZED }))
        .route(
            "/products/{id}",
            get(|Path(id): Path<String>| async move {
                if id == PRODUCT_ID {
                    (StatusCode::OK, "<html>not json</html>").into_response()
                } else {
                    StatusCode::UNAUTHORIZED.into_response()
                }
            }),
        )
        .route("/users/token", get(token))
        .route("/users/{id}", get(|| async { StatusCode::FORBIDDEN }));
    let app = Router::new().nest("/v1", api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn test_config(backend: SocketAddr) -> AppConfig {
    let root = env!("CARGO_MANIFEST_DIR");
    let mut config = AppConfig::default();
    config.web.session_secret = STANDARD.encode([42u8; 64]);
    config.web.secure_cookies = false;
    config.web.templates_dir = format!("{root}/ui/html").into();
    config.web.static_dir = format!("{root}/ui/static").into();
    config.backend.base_url = format!("http://{backend}/v1");
    config
}

pub async fn client_for(config: AppConfig) -> TestClient {
    let server = HttpServer::new(config, Shutdown::new()).unwrap();
    TestClient::new(server.router())
}

/// Storefront wired to a fresh mock backend.
pub async fn client() -> TestClient {
    let backend = start_mock_backend().await;
    client_for(test_config(backend)).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Drives the router in-process, carrying cookies between requests like a browser.
pub struct TestClient {
    router: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            cookies: HashMap::new(),
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            self.store_cookie(set_cookie.to_str().unwrap());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let mut attributes = set_cookie.split(';').map(str::trim);
        let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let expired = attributes.any(|a| a.eq_ignore_ascii_case("max-age=0"));
        if expired || value.is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    /// Load `path` and pull the CSRF token out of its hidden form field.
    pub async fn csrf_token(&mut self, path: &str) -> String {
        let page = self.get(path).await;
        assert_eq!(page.status, StatusCode::OK, "GET {path}");
        extract_csrf_token(&page.body).expect("page has a csrf_token field")
    }

    pub async fn log_in(&mut self) -> TestResponse {
        let token = self.csrf_token("/user/login").await;
        self.post_form(
            "/user/login",
            &[("csrf_token", token.as_str()), ("email", EMAIL), ("password", PASSWORD)],
        )
        .await
    }
}

pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = "name='csrf_token' value='";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('\'')? + start;
    Some(html[start..end].to_string())
}
