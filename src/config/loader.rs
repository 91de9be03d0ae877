//! Upstream resolution and persistence.
//!
//! The upstream base URL comes from the first available source:
//! 1. the `CORS_RELAY_UPSTREAM` environment variable,
//! 2. the `--upstream` CLI flag (persisted for future runs),
//! 3. the persisted file under the home directory,
//! 4. the built-in default.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::schema::{RelayConfig, UpstreamConfig};

/// Environment variable overriding every other upstream source.
pub const UPSTREAM_ENV: &str = "CORS_RELAY_UPSTREAM";

/// File the last flag-supplied upstream is cached in, under the home directory.
const SAVED_CONFIG_FILE: &str = ".cors-relay.json";

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "cors-relay")]
#[command(about = "CORS-injecting relay in front of a single upstream API", long_about = None)]
pub struct CliArgs {
    /// Upstream API base URL (example: http://localhost:8283/v1).
    #[arg(long)]
    pub upstream: Option<String>,

    /// Host to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8284)]
    pub port: u16,
}

/// Error type for configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid upstream url {url:?}: {source}")]
    InvalidUpstream {
        url: String,
        source: url::ParseError,
    },

    #[error("home directory is not available")]
    NoHomeDir,
}

/// Persisted slice of the configuration.
#[derive(Debug, Deserialize, Serialize)]
struct SavedConfig {
    upstream_url: String,
}

/// Resolve the effective configuration from all sources.
pub fn resolve(args: &CliArgs) -> Result<RelayConfig, ConfigError> {
    let env_upstream = std::env::var(UPSTREAM_ENV).ok();
    let saved = match load_saved() {
        Ok(saved) => saved.map(|s| s.upstream_url),
        Err(error) => {
            tracing::warn!(error = %error, "ignoring unreadable saved configuration");
            None
        }
    };

    let (base_url, persist) = resolve_upstream(env_upstream, args.upstream.as_deref(), saved)?;
    if persist {
        // Remember the flag value for future runs.
        if let Err(error) = save(&base_url) {
            tracing::warn!(error = %error, "failed to persist upstream url");
        }
    }

    let mut config = RelayConfig::default();
    config.listener.host = args.host.clone();
    config.listener.port = args.port;
    config.upstream.base_url = base_url;
    Ok(config)
}

/// Pure precedence chain. Returns the chosen base URL and whether it should
/// be persisted (only flag-supplied values are).
fn resolve_upstream(
    env: Option<String>,
    flag: Option<&str>,
    saved: Option<String>,
) -> Result<(String, bool), ConfigError> {
    if let Some(url) = env.filter(|v| !v.is_empty()) {
        return Ok((normalize_base_url(&url)?, false));
    }
    if let Some(url) = flag {
        return Ok((normalize_base_url(url)?, true));
    }
    if let Some(url) = saved.filter(|v| !v.is_empty()) {
        return Ok((normalize_base_url(&url)?, false));
    }
    Ok((UpstreamConfig::default().base_url, false))
}

/// Trim trailing slashes and check the URL parses at all.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    Url::parse(trimmed).map_err(|source| ConfigError::InvalidUpstream {
        url: raw.to_string(),
        source,
    })?;
    Ok(trimmed.to_string())
}

fn saved_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(SAVED_CONFIG_FILE))
        .ok_or(ConfigError::NoHomeDir)
}

fn load_saved() -> Result<Option<SavedConfig>, ConfigError> {
    let path = saved_config_path()?;
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    Ok(Some(serde_json::from_str(&data)?))
}

fn save(upstream_url: &str) -> Result<(), ConfigError> {
    let path = saved_config_path()?;
    let saved = SavedConfig {
        upstream_url: upstream_url.to_string(),
    };
    let data = serde_json::to_string_pretty(&saved)?;
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_wins() {
        let (url, persist) = resolve_upstream(
            Some("http://env.example/v1".to_string()),
            Some("http://flag.example/v1"),
            Some("http://saved.example/v1".to_string()),
        )
        .unwrap();
        assert_eq!(url, "http://env.example/v1");
        assert!(!persist);
    }

    #[test]
    fn test_flag_beats_saved_and_is_persisted() {
        let (url, persist) = resolve_upstream(
            None,
            Some("http://flag.example/v1"),
            Some("http://saved.example/v1".to_string()),
        )
        .unwrap();
        assert_eq!(url, "http://flag.example/v1");
        assert!(persist);
    }

    #[test]
    fn test_saved_value_is_used_when_nothing_else_is_set() {
        let (url, persist) =
            resolve_upstream(None, None, Some("http://saved.example/v1".to_string())).unwrap();
        assert_eq!(url, "http://saved.example/v1");
        assert!(!persist);
    }

    #[test]
    fn test_falls_back_to_default() {
        let (url, _) = resolve_upstream(None, None, None).unwrap();
        assert_eq!(url, UpstreamConfig::default().base_url);
    }

    #[test]
    fn test_empty_env_var_is_ignored() {
        let (url, _) = resolve_upstream(
            Some(String::new()),
            None,
            Some("http://saved.example/v1".to_string()),
        )
        .unwrap();
        assert_eq!(url, "http://saved.example/v1");
    }

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        assert_eq!(
            normalize_base_url("http://localhost:8283/v1/").unwrap(),
            "http://localhost:8283/v1"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8283").unwrap(),
            "http://localhost:8283"
        );
    }

    #[test]
    fn test_unparseable_upstream_is_rejected() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(ConfigError::InvalidUpstream { .. })
        ));
    }
}
