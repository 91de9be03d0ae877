//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! captured inbound request (parts + owned body buffer)
//!     → is_multipart_upload() decides the branch
//!     → standard.rs (ordinary traffic, body relayed as-is)
//!       or upload.rs (multipart decode + re-encode)
//!     → target.rs composes the upstream URL
//!     → shared reqwest client executes (redirects never followed)
//!     → relay_response() copies status + filtered headers, streams the body
//! ```
//!
//! # Design Decisions
//! - One client, one redirect policy: redirect responses belong to the
//!   caller on both branches
//! - Hop-by-hop and upstream CORS headers are filtered on both branches
//! - Errors carry their upstream cause text; the caller owns retry decisions

pub mod standard;
pub mod target;
pub mod upload;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use thiserror::Error;

use crate::http::headers;

/// Errors that can occur while relaying a request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Inbound body could not be drained.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    /// Outbound URL could not be built from the configured base and path.
    #[error("invalid upstream url: {0}")]
    InvalidUrl(#[source] url::ParseError),

    /// Transport-level failure talking to the upstream (DNS, connect, TLS).
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    /// Inbound multipart payload was malformed or exceeded the size limit.
    #[error("invalid multipart payload: {0}")]
    UploadForm(#[source] multer::Error),

    /// The rebuilt multipart body could not be constructed.
    #[error("failed to rebuild multipart body: {0}")]
    UploadEncode(#[source] reqwest::Error),

    /// Multipart form did not carry the expected file field.
    #[error("multipart form is missing the \"file\" field")]
    MissingFile,
}

impl RelayError {
    /// Status code surfaced to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RelayError::MissingFile => StatusCode::BAD_REQUEST,
            RelayError::BodyRead(_)
            | RelayError::InvalidUrl(_)
            | RelayError::UploadForm(_)
            | RelayError::UploadEncode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Routing predicate: does this request take the upload branch?
///
/// A pure function of method and `Content-Type` — POST with a
/// `multipart/form-data` token. Everything else, including multipart bodies
/// on other methods, is forwarded as-is by the standard branch.
pub fn is_multipart_upload(method: &Method, headers: &HeaderMap) -> bool {
    if *method != Method::POST {
        return false;
    }
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|content_type| content_type.to_ascii_lowercase().contains("multipart/form-data"))
        .unwrap_or(false)
}

/// Build the client-facing response from an upstream one.
///
/// Copies the status code, relays end-to-end headers (hop-by-hop and
/// upstream CORS headers dropped), and streams the body through. A failure
/// while streaming can only be logged: the status line is already committed,
/// so the connection just ends short.
pub(crate) fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = headers::relay_headers(upstream.headers());

    let body_stream = upstream.bytes_stream().inspect_err(|error| {
        tracing::warn!(error = %error, "upstream response body ended early");
    });

    let mut response = Response::new(Body::from_stream(body_stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
