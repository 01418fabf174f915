//! Liveness probe.

/// Always `OK`; no session, no CSRF, no backend.
pub async fn ping() -> &'static str {
    "OK"
}
