//! CORS-injecting forwarding relay for a single upstream HTTP API.
//!
//! Sits between a browser-based client and an API server that speaks no
//! CORS: every request is forwarded to the configured upstream, every
//! response comes back with permissive cross-origin headers, and multipart
//! file uploads are decoded and re-encoded on the way through.

pub mod config;
pub mod forward;
pub mod http;

pub use config::RelayConfig;
pub use http::HttpServer;
