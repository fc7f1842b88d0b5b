//! Race domain types shared between the engine and its consumers.
//!
//! - [`config`] - Track, ramp, physics, timing and LED configuration sections
//! - [`state`] - Race status and race events
//! - [`error`] - Command errors and tick fault flags
//! - [`telemetry`] - Serializable telemetry and command reply records

pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;
