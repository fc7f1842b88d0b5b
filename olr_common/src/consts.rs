//! System-wide constants for the OLR workspace.
//!
//! Single source of truth for defaults and hard limits.
//! Imported by all crates, no duplication permitted.

use static_assertions::const_assert;

// ─── Identity ───────────────────────────────────────────────────────

/// Player identifier, valid range `1..=max_players`.
pub type PlayerId = u8;

/// Lap counter type.
pub type LapNumber = u8;

// ─── Scheduling ─────────────────────────────────────────────────────

/// Physics tick period [ms] (20 Hz).
pub const PHYSICS_PERIOD_MS: u64 = 50;

/// LED render tick period [ms].
pub const LED_PERIOD_MS: u64 = 50;

/// Telemetry emission period [ms].
pub const TELEMETRY_PERIOD_MS: u64 = 1000;

/// Countdown between `start` and the green light [ms].
pub const COUNTDOWN_MS: u64 = 2000;

/// Upper bound for any task period [ms].
pub const PERIOD_MS_MAX: u64 = 60_000;

// ─── Race ───────────────────────────────────────────────────────────

/// Default roster cap.
pub const MAX_PLAYERS: u8 = 4;

/// Compile-time roster capacity (fixed-size storage).
pub const MAX_PLAYERS_LIMIT: usize = 8;

/// Default laps to finish.
pub const DEFAULT_LAPS: LapNumber = 5;

/// Maximum configurable laps.
pub const MAX_LAPS: LapNumber = 99;

// ─── Track ──────────────────────────────────────────────────────────

/// Default track length [track units].
pub const DEFAULT_TRACK_LENGTH: f64 = 35.0;

/// Default ramp geometry [track units].
pub const DEFAULT_RAMP_START: f64 = 10.0;
pub const DEFAULT_RAMP_CENTER: f64 = 15.0;
pub const DEFAULT_RAMP_END: f64 = 20.0;
pub const DEFAULT_RAMP_HEIGHT: f64 = 12.0;

// ─── Physics ────────────────────────────────────────────────────────

/// Horizontal velocity lost per tick.
pub const DEFAULT_FRICTION: f64 = 0.006;

/// Vertical velocity lost per tick while airborne.
pub const DEFAULT_GRAVITY: f64 = 0.015;

/// Velocity gained per accelerate press.
pub const DEFAULT_ACCELERATION: f64 = 0.2;

/// Velocity removed per brake press.
pub const DEFAULT_BRAKE: f64 = 0.2;

/// Forward speed cap [track units / tick].
pub const DEFAULT_MAX_SPEED: f64 = 2.0;

/// Velocity given to every player when the race starts.
pub const DEFAULT_INITIAL_SPEED: f64 = 0.0;

// ─── LED Strip ──────────────────────────────────────────────────────

/// Global LED brightness (0..=255).
pub const LED_BRIGHTNESS: u8 = 160;

/// Default data pin of the strip.
pub const LED_DEFAULT_PIN: u8 = 5;

/// Default number of pixels.
pub const DEFAULT_STRIP_LENGTH: usize = 100;

/// Maximum number of pixels.
pub const MAX_STRIP_LENGTH: usize = 1000;

/// Default tail length [pixels].
pub const DEFAULT_TAIL_LENGTH: usize = 3;

/// Maximum tail length [pixels].
pub const MAX_TAIL_LENGTH: usize = 20;

// ─── Network (consumed by the external network layer) ───────────────

/// Default mDNS hostname.
pub const HOSTNAME: &str = "olr-wifi-esp";

/// Default web server port.
pub const WEB_PORT: u16 = 80;

// ─── Paths ──────────────────────────────────────────────────────────

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/olr.toml";

const_assert!(MAX_PLAYERS as usize <= MAX_PLAYERS_LIMIT);
const_assert!(DEFAULT_LAPS <= MAX_LAPS);
const_assert!(DEFAULT_STRIP_LENGTH <= MAX_STRIP_LENGTH);
const_assert!(DEFAULT_TAIL_LENGTH <= MAX_TAIL_LENGTH);
