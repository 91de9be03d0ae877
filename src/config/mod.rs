//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! env var / CLI flags / persisted file
//!     → loader.rs (precedence chain, trailing-slash normalization)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the server and forwarders
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; nothing reloads at runtime
//! - A flag-supplied upstream is persisted so the next run remembers it
//! - Persistence failures are logged, never fatal

pub mod loader;
pub mod schema;

pub use schema::ListenerConfig;
pub use schema::RelayConfig;
pub use schema::UpstreamConfig;
