//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, preflight short-circuit, body capture)
//!     → request.rs (add request ID)
//!     → [forward subsystem picks a branch and talks to the upstream]
//!     → headers.rs (filter relayed headers)
//!     → cors.rs (stamp CORS headers, always last)
//!     → Send to client
//! ```

pub mod cors;
pub mod headers;
pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
