//! TOML configuration for Arbiter binaries.
//!
//! Every application config embeds a `[shared]` section ([`SharedConfig`])
//! and picks up [`ConfigLoader`] through a blanket impl, so loading is one
//! call:
//!
//! ```rust,no_run
//! use arbiter_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct BotConfig {
//!     shared: SharedConfig,
//!     period_ms: u32,
//! }
//!
//! fn load() -> Result<BotConfig, ConfigError> {
//!     let config = BotConfig::load(Path::new("config/arbiter.toml"))?;
//!     config.shared.validate()?;
//!     Ok(config)
//! }
//! ```
//!
//! Parsing and semantic validation are separate steps: the loader only
//! checks that the document matches the Rust type.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

/// Failure while reading, parsing or validating a config document.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("config file not found")]
    FileNotFound,

    /// File exists but could not be read.
    #[error("cannot read config: {0}")]
    ReadError(String),

    /// Malformed TOML, unknown key or wrong value type.
    #[error("invalid config document: {0}")]
    ParseError(String),

    /// Well-formed document with out-of-range or inconsistent values.
    #[error("config rejected: {0}")]
    ValidationError(String),
}

/// Minimum log severity, written in lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// The `[shared]` section every Arbiter config carries.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "arbiter-practice-bot"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance name attached to startup logs.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: String::from("arbiter"),
        }
    }
}

impl SharedConfig {
    /// Rejects a blank `service_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name is blank".into(),
            ));
        }
        Ok(())
    }
}

/// TOML loading for any deserializable config type.
///
/// A missing file maps to [`ConfigError::FileNotFound`] so callers can fall
/// back to defaults; every other I/O failure is [`ConfigError::ReadError`].
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound,
            _ => ConfigError::ReadError(format!("{}: {e}", path.display())),
        })?;
        Self::from_toml_str(&content)
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
