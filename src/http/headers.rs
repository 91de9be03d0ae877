//! Header classification and relay helpers.
//!
//! # Responsibilities
//! - Classify hop-by-hop headers that must not cross the relay
//! - Copy end-to-end request headers toward the upstream
//! - Copy upstream response headers back to the client
//!
//! # Design Decisions
//! - Classification is case-insensitive over arbitrary strings
//! - Request copy uses set semantics (last value per key wins)
//! - Response copy uses append semantics so repeated headers survive

use axum::http::header::{HeaderMap, HOST};

/// Headers scoped to a single transport link. Relaying them verbatim would
/// describe the wrong connection; `content-length` in particular must be
/// recomputed once the body has been re-buffered or re-encoded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Returns true if the header is hop-by-hop and must not be relayed.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Copy the end-to-end headers of an inbound request for forwarding.
///
/// Hop-by-hop headers are dropped. `host` is dropped as well: the outbound
/// host is derived from the target URL, not the address the client dialed.
pub fn copy_end_to_end(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for (name, value) in inbound {
        if is_hop_by_hop(name.as_str()) || *name == HOST {
            continue;
        }
        outbound.insert(name.clone(), value.clone());
    }
    outbound
}

/// Copy upstream response headers for the client-facing response.
///
/// Hop-by-hop headers are dropped, and so is anything `access-control-*`:
/// the relay's own CORS headers are authoritative and are stamped on after
/// this copy.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::new();
    for (name, value) in upstream {
        if is_hop_by_hop(name.as_str()) || name.as_str().starts_with("access-control-") {
            continue;
        }
        relayed.append(name.clone(), value.clone());
    }
    relayed
}
