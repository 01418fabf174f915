//! Template filters.

use chrono::DateTime;
use minijinja::Environment;

pub fn register(env: &mut Environment<'_>) {
    env.add_filter("human_date", human_date);
    env.add_filter("short_id", short_id);
    env.add_filter("incr", incr);
}

/// `2019-03-24T10:05:00Z` → `24 Mar 2019 at 10:05`, in UTC.
///
/// Missing or unparsable timestamps render as an empty string.
pub fn human_date(value: Option<String>) -> String {
    value
        .as_deref()
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.naive_utc().format("%d %b %Y at %H:%M").to_string())
        .unwrap_or_default()
}

/// First eight characters of an id.
pub fn short_id(value: String) -> String {
    value.chars().take(8).collect()
}

pub fn incr(value: i64) -> i64 {
    value + 1
}
