//! Standard request forwarding.
//!
//! Handles everything that is not a multipart file upload: the inbound
//! request is rebuilt against the upstream base URL with its already-captured
//! body attached, hop-by-hop headers dropped, and the upstream response is
//! relayed with the status and `Location` of any redirect left intact.

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::Response;

use super::{relay_response, target, RelayError};
use crate::http::headers;

/// Forward one ordinary request and relay the upstream response.
pub async fn forward(
    client: &reqwest::Client,
    base_url: &str,
    parts: &Parts,
    body: Bytes,
) -> Result<Response, RelayError> {
    let url = target::compose_url(base_url, &parts.uri).map_err(RelayError::InvalidUrl)?;
    tracing::debug!(upstream_url = %url, method = %parts.method, "forwarding request");

    let mut outbound_headers = headers::copy_end_to_end(&parts.headers);
    // API callers routinely omit the content type on JSON bodies.
    if !body.is_empty() && !outbound_headers.contains_key(CONTENT_TYPE) {
        outbound_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    let mut request = client
        .request(parts.method.clone(), url)
        .headers(outbound_headers);
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = request.send().await.map_err(RelayError::Upstream)?;
    tracing::debug!(status = %upstream.status(), "relaying upstream response");
    Ok(relay_response(upstream))
}
