//! Configuration sections for a race.
//!
//! All types use `serde::Deserialize` for TOML loading and fall back to the
//! defaults in [`crate::consts`]. Each section exposes `validate()` returning a
//! human-readable reason on failure; cross-section checks live in
//! [`RaceConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::consts::{
    COUNTDOWN_MS, DEFAULT_ACCELERATION, DEFAULT_BRAKE, DEFAULT_FRICTION, DEFAULT_GRAVITY,
    DEFAULT_INITIAL_SPEED, DEFAULT_LAPS, DEFAULT_MAX_SPEED, DEFAULT_RAMP_CENTER,
    DEFAULT_RAMP_END, DEFAULT_RAMP_HEIGHT, DEFAULT_RAMP_START, DEFAULT_STRIP_LENGTH,
    DEFAULT_TAIL_LENGTH, DEFAULT_TRACK_LENGTH, LED_BRIGHTNESS, LED_DEFAULT_PIN,
    LED_PERIOD_MS, LapNumber, MAX_LAPS, MAX_PLAYERS, MAX_PLAYERS_LIMIT, MAX_STRIP_LENGTH,
    MAX_TAIL_LENGTH, PERIOD_MS_MAX, PHYSICS_PERIOD_MS, TELEMETRY_PERIOD_MS,
};

// ─── Race Rules ─────────────────────────────────────────────────────

/// Lap count and roster cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRules {
    /// Laps needed to finish (default: 5).
    #[serde(default = "default_total_laps")]
    pub total_laps: LapNumber,

    /// Roster cap (default: 4, at most `MAX_PLAYERS_LIMIT`).
    #[serde(default = "default_max_players")]
    pub max_players: u8,
}

fn default_total_laps() -> LapNumber {
    DEFAULT_LAPS
}
fn default_max_players() -> u8 {
    MAX_PLAYERS
}

impl Default for RaceRules {
    fn default() -> Self {
        Self {
            total_laps: default_total_laps(),
            max_players: default_max_players(),
        }
    }
}

impl RaceRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.total_laps == 0 || self.total_laps > MAX_LAPS {
            return Err(format!(
                "total_laps {} out of range [1, {}]",
                self.total_laps, MAX_LAPS
            ));
        }
        if self.max_players == 0 || self.max_players as usize > MAX_PLAYERS_LIMIT {
            return Err(format!(
                "max_players {} out of range [1, {}]",
                self.max_players, MAX_PLAYERS_LIMIT
            ));
        }
        Ok(())
    }
}

// ─── Track & Ramp ───────────────────────────────────────────────────

/// Ramp segment of the track.
///
/// Invariant: `0 <= start < center < end <= track length`, `height > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    pub start: f64,
    pub center: f64,
    pub end: f64,
    pub height: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_RAMP_START,
            center: DEFAULT_RAMP_CENTER,
            end: DEFAULT_RAMP_END,
            height: DEFAULT_RAMP_HEIGHT,
        }
    }
}

impl RampConfig {
    /// Check ordering and bounds against the track length.
    pub fn validate(&self, track_length: f64) -> Result<(), String> {
        let values = [self.start, self.center, self.end, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("ramp values must be finite".to_string());
        }
        if !(0.0 <= self.start
            && self.start < self.center
            && self.center < self.end
            && self.end <= track_length)
        {
            return Err(format!(
                "ramp must satisfy 0 <= start < center < end <= {track_length} \
                 (got start={}, center={}, end={})",
                self.start, self.center, self.end
            ));
        }
        if self.height <= 0.0 {
            return Err(format!("ramp height {} must be > 0", self.height));
        }
        Ok(())
    }

    /// True if `position` lies in `[start, end)`.
    #[inline]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position < self.end
    }

    /// Normalised ramp profile at `position`: 0 at both ends, 1 at the crest.
    pub fn profile(&self, position: f64) -> f64 {
        if !self.contains(position) {
            0.0
        } else if position < self.center {
            (position - self.start) / (self.center - self.start)
        } else {
            (self.end - position) / (self.end - self.center)
        }
    }
}

/// Track geometry.
///
/// When the `[track]` table is present but `[track.ramp]` is not, the track
/// is flat. When `[track]` is omitted entirely, the default ramp is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Track length [track units] (default: 35).
    #[serde(default = "default_track_length")]
    pub length: f64,

    /// Optional ramp segment.
    #[serde(default)]
    pub ramp: Option<RampConfig>,
}

fn default_track_length() -> f64 {
    DEFAULT_TRACK_LENGTH
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            length: default_track_length(),
            ramp: Some(RampConfig::default()),
        }
    }
}

impl TrackConfig {
    /// Flat track of the given length.
    pub const fn flat(length: f64) -> Self {
        Self { length, ramp: None }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(format!("track length {} must be finite and > 0", self.length));
        }
        match self.ramp {
            Some(ramp) => ramp.validate(self.length),
            None => Ok(()),
        }
    }
}

// ─── Physics ────────────────────────────────────────────────────────

/// Physics parameters, per tick. Read-only while a race is running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_friction")]
    pub friction: f64,
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    #[serde(default = "default_brake")]
    pub brake: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,
}

fn default_friction() -> f64 {
    DEFAULT_FRICTION
}
fn default_gravity() -> f64 {
    DEFAULT_GRAVITY
}
fn default_acceleration() -> f64 {
    DEFAULT_ACCELERATION
}
fn default_brake() -> f64 {
    DEFAULT_BRAKE
}
fn default_max_speed() -> f64 {
    DEFAULT_MAX_SPEED
}
fn default_initial_speed() -> f64 {
    DEFAULT_INITIAL_SPEED
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: default_friction(),
            gravity: default_gravity(),
            acceleration: default_acceleration(),
            brake: default_brake(),
            max_speed: default_max_speed(),
            initial_speed: default_initial_speed(),
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("friction", self.friction),
            ("gravity", self.gravity),
            ("acceleration", self.acceleration),
            ("brake", self.brake),
            ("max_speed", self.max_speed),
            ("initial_speed", self.initial_speed),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} {value} must be finite and >= 0"));
            }
        }
        if self.gravity == 0.0 {
            return Err("gravity must be > 0".to_string());
        }
        if self.max_speed == 0.0 {
            return Err("max_speed must be > 0".to_string());
        }
        if self.initial_speed > self.max_speed {
            return Err(format!(
                "initial_speed {} exceeds max_speed {}",
                self.initial_speed, self.max_speed
            ));
        }
        Ok(())
    }
}

// ─── Timing ─────────────────────────────────────────────────────────

/// Periods of the three scheduled tasks and the start countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_physics_period")]
    pub physics_period_ms: u64,
    #[serde(default = "default_led_period")]
    pub led_period_ms: u64,
    #[serde(default = "default_telemetry_period")]
    pub telemetry_period_ms: u64,
    #[serde(default = "default_countdown")]
    pub countdown_ms: u64,
}

fn default_physics_period() -> u64 {
    PHYSICS_PERIOD_MS
}
fn default_led_period() -> u64 {
    LED_PERIOD_MS
}
fn default_telemetry_period() -> u64 {
    TELEMETRY_PERIOD_MS
}
fn default_countdown() -> u64 {
    COUNTDOWN_MS
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            physics_period_ms: default_physics_period(),
            led_period_ms: default_led_period(),
            telemetry_period_ms: default_telemetry_period(),
            countdown_ms: default_countdown(),
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), String> {
        let periods = [
            ("physics_period_ms", self.physics_period_ms),
            ("led_period_ms", self.led_period_ms),
            ("telemetry_period_ms", self.telemetry_period_ms),
        ];
        for (name, value) in periods {
            if value == 0 || value > PERIOD_MS_MAX {
                return Err(format!("{name} {value} out of range [1, {PERIOD_MS_MAX}]"));
            }
        }
        if self.countdown_ms > PERIOD_MS_MAX {
            return Err(format!(
                "countdown_ms {} exceeds {PERIOD_MS_MAX}",
                self.countdown_ms
            ));
        }
        Ok(())
    }

    /// Countdown length in physics ticks, rounded up.
    pub fn countdown_ticks(&self) -> u32 {
        self.countdown_ms.div_ceil(self.physics_period_ms.max(1)) as u32
    }
}

// ─── LED Strip ──────────────────────────────────────────────────────

/// LED strip geometry and rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    #[serde(default = "default_strip_length")]
    pub strip_length: usize,
    /// Opaque output target handed to the driver.
    #[serde(default = "default_pin")]
    pub pin: u8,
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    #[serde(default = "default_tail_length")]
    pub tail_length: usize,
}

fn default_strip_length() -> usize {
    DEFAULT_STRIP_LENGTH
}
fn default_pin() -> u8 {
    LED_DEFAULT_PIN
}
fn default_brightness() -> u8 {
    LED_BRIGHTNESS
}
fn default_tail_length() -> usize {
    DEFAULT_TAIL_LENGTH
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            strip_length: default_strip_length(),
            pin: default_pin(),
            brightness: default_brightness(),
            tail_length: default_tail_length(),
        }
    }
}

impl LedConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.strip_length == 0 || self.strip_length > MAX_STRIP_LENGTH {
            return Err(format!(
                "strip_length {} out of range [1, {MAX_STRIP_LENGTH}]",
                self.strip_length
            ));
        }
        if self.tail_length > MAX_TAIL_LENGTH {
            return Err(format!(
                "tail_length {} exceeds {MAX_TAIL_LENGTH}",
                self.tail_length
            ));
        }
        Ok(())
    }
}

// ─── Race Bundle ────────────────────────────────────────────────────

/// The sections that shape one race instance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RaceConfig {
    pub rules: RaceRules,
    pub track: TrackConfig,
    pub physics: PhysicsConfig,
}

impl RaceConfig {
    /// Validate every section plus the cross-section constraints.
    pub fn validate(&self) -> Result<(), String> {
        self.rules.validate().map_err(|e| format!("[race] {e}"))?;
        self.track.validate().map_err(|e| format!("[track] {e}"))?;
        self.physics
            .validate()
            .map_err(|e| format!("[physics] {e}"))?;
        if self.physics.max_speed >= self.track.length {
            return Err(format!(
                "[physics] max_speed {} must be below track length {}",
                self.physics.max_speed, self.track.length
            ));
        }
        Ok(())
    }
}
