//! Engine configuration loading.
//!
//! Reads `OlrConfig` from TOML, applies command-line overrides and validates
//! the result. Nothing downstream sees an unvalidated configuration.

use std::path::Path;

use tracing::{debug, info};

use olr_common::config::{ConfigError, ConfigLoader, OlrConfig};
use olr_common::consts::LapNumber;

/// Values given on the command line that replace the file's.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub strip_length: Option<usize>,
    pub total_laps: Option<LapNumber>,
}

/// Load, override and validate the configuration file at `path`.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<OlrConfig, ConfigError> {
    debug!("Loading config from {}", path.display());
    let config = OlrConfig::load(path)?;
    finish(config, overrides)
}

/// Same as [`load_config`] but from an in-memory TOML document.
pub fn load_config_from_str(
    content: &str,
    overrides: &ConfigOverrides,
) -> Result<OlrConfig, ConfigError> {
    finish(OlrConfig::from_toml(content)?, overrides)
}

fn finish(mut config: OlrConfig, overrides: &ConfigOverrides) -> Result<OlrConfig, ConfigError> {
    if let Some(strip_length) = overrides.strip_length {
        config.led.strip_length = strip_length;
    }
    if let Some(total_laps) = overrides.total_laps {
        config.race.total_laps = total_laps;
    }
    config.validate()?;
    info!(
        "Config OK: track={} laps={} players<={} strip={}px physics={}ms",
        config.track.length,
        config.race.total_laps,
        config.race.max_players,
        config.led.strip_length,
        config.timing.physics_period_ms,
    );
    Ok(config)
}
