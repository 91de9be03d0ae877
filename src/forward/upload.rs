//! Multipart upload forwarding.
//!
//! File uploads cannot be relayed byte-for-byte: the inbound form is decoded,
//! the single expected file part is lifted out, and a brand-new multipart
//! body with a fresh boundary is serialized for the upstream. Field name and
//! filename survive the round trip; `Content-Type` and `Content-Length` are
//! replaced to describe the rebuilt body.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::response::Response;
use multer::{Constraints, Multipart, SizeLimit};
use reqwest::multipart::{Form, Part};

use super::{relay_response, target, RelayError};
use crate::http::headers;

/// Largest accepted multipart payload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Field name the upload is expected under.
pub const FILE_FIELD: &str = "file";

/// The one file part extracted from an inbound upload form.
#[derive(Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Decode an inbound upload, re-encode it, and relay the upstream response.
pub async fn forward(
    client: &reqwest::Client,
    base_url: &str,
    parts: &Parts,
    body: Bytes,
) -> Result<Response, RelayError> {
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    // Parse before composing the URL or touching the network: an oversized
    // or malformed form must never reach the upstream.
    let file = parse_form(content_type, body).await?;

    let url = target::compose_url(base_url, &parts.uri).map_err(RelayError::InvalidUrl)?;
    tracing::debug!(
        upstream_url = %url,
        file_name = %file.file_name,
        bytes = file.data.len(),
        "forwarding upload"
    );

    let mut outbound_headers = headers::copy_end_to_end(&parts.headers);
    // The rebuilt form carries its own boundary.
    outbound_headers.remove(CONTENT_TYPE);

    let mut part = Part::bytes(file.data.to_vec()).file_name(file.file_name);
    if let Some(part_type) = &file.content_type {
        part = part.mime_str(part_type).map_err(RelayError::UploadEncode)?;
    }
    let form = Form::new().part(FILE_FIELD, part);

    let upstream = client
        .request(parts.method.clone(), url)
        .headers(outbound_headers)
        .multipart(form)
        .send()
        .await
        .map_err(RelayError::Upstream)?;

    tracing::debug!(status = %upstream.status(), "relaying upload response");
    Ok(relay_response(upstream))
}

/// Decode the inbound multipart form from the captured body buffer.
///
/// Enforces [`MAX_UPLOAD_BYTES`] over the whole stream and returns the part
/// under [`FILE_FIELD`]; other fields are skipped. A form without the file
/// field is a caller error ([`RelayError::MissingFile`], 400), everything
/// else a malformed payload (500).
pub(crate) async fn parse_form(content_type: &str, body: Bytes) -> Result<UploadFile, RelayError> {
    let boundary = multer::parse_boundary(content_type).map_err(RelayError::UploadForm)?;
    let constraints =
        Constraints::new().size_limit(SizeLimit::new().whole_stream(MAX_UPLOAD_BYTES));
    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut form = Multipart::with_constraints(stream, boundary, constraints);

    while let Some(field) = form.next_field().await.map_err(RelayError::UploadForm)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or(FILE_FIELD).to_string();
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = field.bytes().await.map_err(RelayError::UploadForm)?;
        return Ok(UploadFile {
            file_name,
            content_type,
            data,
        });
    }

    Err(RelayError::MissingFile)
}
