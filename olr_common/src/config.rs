//! Configuration loading traits and types.
//!
//! This module provides the standard way to load the TOML configuration of
//! the race engine. Every section is optional and falls back to the
//! defaults in [`crate::consts`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use olr_common::config::{ConfigError, ConfigLoader, OlrConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = OlrConfig::load(Path::new("config/olr.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::consts::{HOSTNAME, WEB_PORT};
use crate::race::config::{
    LedConfig, PhysicsConfig, RaceConfig, RaceRules, TimingConfig, TrackConfig,
};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-frame output.
    Trace,
    /// Commands and ramp events.
    Debug,
    /// Race lifecycle and laps.
    #[default]
    Info,
    /// Output failures.
    Warn,
    /// Faults only.
    Error,
}

impl LogLevel {
    /// Lowercase name, parses as a `tracing::Level`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "olr-engine-track-a"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "olr-engine".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings handed to the external network layer.
///
/// The engine never reads the credentials. `Debug` redacts the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// mDNS hostname.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Web server port.
    #[serde(default = "default_web_port")]
    pub web_port: u16,

    /// WiFi network name.
    #[serde(default)]
    pub ssid: Option<String>,

    /// WiFi passphrase.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_hostname() -> String {
    HOSTNAME.to_string()
}
fn default_web_port() -> u16 {
    WEB_PORT
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            web_port: default_web_port(),
            ssid: None,
            password: None,
        }
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("hostname", &self.hostname)
            .field("web_port", &self.web_port)
            .field("ssid", &self.ssid)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl NetworkConfig {
    /// Validate hostname and port.
    pub fn validate(&self) -> Result<(), String> {
        if self.hostname.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }
        if self.web_port == 0 {
            return Err("web_port must be non-zero".to_string());
        }
        Ok(())
    }
}

/// Complete engine configuration, one table per concern.
///
/// Loaded once at startup and passed explicitly to the session, the
/// renderer and the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OlrConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub race: RaceRules,
    #[serde(default)]
    pub track: TrackConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub led: LedConfig,
}

impl OlrConfig {
    /// Parse a configuration from a TOML string without touching the filesystem.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate every section.
    ///
    /// The first failing section is reported, prefixed with its table name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        let sections = [
            ("network", self.network.validate()),
            ("timing", self.timing.validate()),
            ("led", self.led.validate()),
        ];
        for (name, result) in sections {
            result.map_err(|e| ConfigError::ValidationError(format!("[{name}] {e}")))?;
        }
        self.race_config()
            .validate()
            .map_err(ConfigError::ValidationError)
    }

    /// Bundle of the sections that shape one race.
    pub fn race_config(&self) -> RaceConfig {
        RaceConfig {
            rules: self.race,
            track: self.track,
            physics: self.physics,
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// Default implementation for any type implementing
/// `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation: any serde-deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
