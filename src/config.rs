//! Configuration for the analyzer, loaded from the environment.
//!
//! A `.env` file in the working directory is read at startup, before any of
//! these are resolved.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::extract::DEFAULT_MIN_TEXT_CHARS;
use crate::llm::LlmConfig;

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Default maximum upload size (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default origin allowed by CORS, where the web frontend runs.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Documents with less extracted text than this are rejected.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_cors_origin")]
    pub cors_allowed_origin: String,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_min_text_chars() -> usize {
    DEFAULT_MIN_TEXT_CHARS
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_cors_origin() -> String {
    DEFAULT_CORS_ORIGIN.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            min_text_chars: default_min_text_chars(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_allowed_origin: default_cors_origin(),
        }
    }
}

impl ServerConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars: `BIND_ADDR`, `MIN_TEXT_CHARS`, `MAX_UPLOAD_BYTES`,
    /// `CORS_ALLOWED_ORIGIN`. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BIND_ADDR") {
            if let Ok(addr) = parse_bind_address(&val) {
                self.bind_addr = addr;
            }
        }
        if let Ok(val) = std::env::var("MIN_TEXT_CHARS") {
            if let Ok(n) = val.parse() {
                self.min_text_chars = n;
            }
        }
        if let Ok(val) = std::env::var("MAX_UPLOAD_BYTES") {
            if let Ok(n) = val.parse() {
                self.max_upload_bytes = n;
            }
        }
        if let Ok(val) = std::env::var("CORS_ALLOWED_ORIGIN") {
            self.cors_allowed_origin = val;
        }
        self
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    /// Defaults overridden by whatever the environment sets.
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::default().with_env_overrides(),
            server: ServerConfig::default().with_env_overrides(),
        }
    }
}

/// Parse a bind address string into a SocketAddr.
///
/// Supports formats:
/// - "5000" -> 127.0.0.1:5000
/// - "0.0.0.0" -> 0.0.0.0:5000
/// - "0.0.0.0:8080" -> 0.0.0.0:8080
/// - "[::1]:8080" -> [::1]:8080
pub fn parse_bind_address(bind: &str) -> Result<SocketAddr, String> {
    let bind = bind.trim();

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(SocketAddr::from(([127, 0, 0, 1], port)));
    }

    if let Ok(addr) = bind.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = bind.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, default_bind_addr().port()));
    }

    Err(format!(
        "Invalid bind address '{}'. Use PORT, HOST, or HOST:PORT",
        bind
    ))
}
