//! Prelude module for common re-exports.
//!
//! ```rust
//! use olr_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, NetworkConfig, OlrConfig, SharedConfig};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{
    DEFAULT_LAPS, LED_BRIGHTNESS, LapNumber, MAX_PLAYERS, MAX_PLAYERS_LIMIT, PlayerId,
};

// ─── Race ───────────────────────────────────────────────────────────
pub use crate::race::config::{
    LedConfig, PhysicsConfig, RaceConfig, RaceRules, RampConfig, TimingConfig, TrackConfig,
};
pub use crate::race::error::{FaultFlags, RaceError};
pub use crate::race::state::{RaceEvent, RaceStatus};
pub use crate::race::telemetry::{CommandReply, PlayerSnapshot, TelemetrySnapshot};

// ─── LED ────────────────────────────────────────────────────────────
pub use crate::led::{Rgb, palette_color};
