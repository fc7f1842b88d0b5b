//! # OLR Race Engine Library
//!
//! Fixed-tick race engine for a one-dimensional LED racetrack.
//!
//! One owner thread runs a cooperative scheduler with three periodic tasks:
//!
//! 1. **physics** ([`physics::advance`]) moves every player and emits lap and
//!    finish events,
//! 2. **render** ([`render::render_into`]) rebuilds the LED frame from scratch,
//! 3. **telemetry** ([`telemetry::snapshot`]) hands a read-only snapshot to the
//!    external sink.
//!
//! External commands (`join`, `start`, `reset`, inputs) are applied between
//! slots through [`race::RaceSession`], so render and telemetry always see a
//! settled state.

pub mod command;
pub mod config;
pub mod cycle;
pub mod output;
pub mod physics;
pub mod race;
pub mod render;
pub mod telemetry;
