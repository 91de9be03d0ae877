//! Outbound URL composition.

use axum::http::Uri;
use url::Url;

/// Normalize an inbound request path for forwarding.
///
/// Strips a single leading slash (the base URL supplies the separator) and
/// preserves a trailing slash when the original path carried one, since some
/// upstream routers treat `/agents` and `/agents/` differently.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.strip_prefix('/').unwrap_or(path).to_string();
    if path.ends_with('/') && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Compose the full upstream URL for an inbound request URI.
///
/// `base_url` carries no trailing slash (config invariant), so the result is
/// always `base + "/" + path`, with the raw query string passed through
/// untouched.
pub fn compose_url(base_url: &str, uri: &Uri) -> Result<Url, url::ParseError> {
    let mut target = format!("{}/{}", base_url, normalize_path(uri.path()));
    if let Some(query) = uri.query() {
        if !query.is_empty() {
            target.push('?');
            target.push_str(query);
        }
    }
    Url::parse(&target)
}
