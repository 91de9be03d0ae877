//! Cross-origin permission headers.
//!
//! The relay answers for an upstream that browsers cannot talk to directly,
//! so every response it produces carries a permissive CORS header set. The
//! injector is idempotent: it is re-applied after upstream response headers
//! are copied, and must not stack duplicate `Vary` values when it is.

use axum::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, VARY,
};

/// Request headers a browser may include on cross-origin calls.
const ALLOWED_HEADERS: &str =
    "Authorization, Content-Type, Accept, Origin, User-Agent, Cache-Control, X-Requested-With";

/// Stamp the relay's CORS headers onto a response header map.
///
/// The five `Access-Control-*` headers are set unconditionally, replacing
/// whatever was there. `Vary` values are appended so caching interacts
/// correctly with CORS, but only when not already present.
pub fn apply(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    // Let browsers cache preflight results for 24 hours.
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("*"));

    append_vary(headers, "Origin");
    append_vary(headers, "Access-Control-Request-Method");
    append_vary(headers, "Access-Control-Request-Headers");
}

/// Append one `Vary` value unless an equivalent one is already present,
/// either as its own header line or inside a comma-separated list.
fn append_vary(headers: &mut HeaderMap, value: &'static str) {
    let present = headers.get_all(VARY).iter().any(|existing| {
        existing
            .to_str()
            .map(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case(value)))
            .unwrap_or(false)
    });
    if !present {
        headers.append(VARY, HeaderValue::from_static(value));
    }
}
