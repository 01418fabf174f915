//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Read the ID back so backend calls can carry it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The same header name is used inbound, outbound to the backend and on the response

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{self, MakeRequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Mints a random UUID for requests arriving without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<request_id::RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(request_id::RequestId::new)
    }
}

/// The current request's ID, if the request-id layer assigned one.
#[derive(Debug, Clone, Default)]
pub struct RequestId(pub Option<HeaderValue>);

impl RequestId {
    pub fn as_str(&self) -> &str {
        self.0
            .as_ref()
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(headers.get(X_REQUEST_ID).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_uuids() {
        let request = Request::new(());
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }

    #[test]
    fn missing_id_reads_as_unknown() {
        assert_eq!(RequestId::default().as_str(), "unknown");
        let id = RequestId(Some(HeaderValue::from_static("abc")));
        assert_eq!(id.as_str(), "abc");
    }
}
