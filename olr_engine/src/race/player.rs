//! Per-player state.

use olr_common::consts::{LapNumber, PlayerId};
use olr_common::race::config::PhysicsConfig;

/// One car on the track.
///
/// `position` is in track units within `[0, length)`. `velocity` is signed,
/// in track units per tick. Vertical fields are only non-zero while airborne.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    /// Join order, selects the colour.
    pub slot: usize,
    pub position: f64,
    pub velocity: f64,
    pub vertical_offset: f64,
    pub vertical_velocity: f64,
    pub airborne: bool,
    /// Inside the ramp region at the end of the previous tick.
    pub on_ramp: bool,
    pub laps_completed: LapNumber,
    pub finished: bool,
    pub rank: Option<u8>,

    // ── Lap timing [ticks] ──
    pub lap_start_tick: u64,
    pub last_lap_ticks: Option<u64>,
    pub best_lap_ticks: Option<u64>,
    pub finish_tick: Option<u64>,
}

impl Player {
    /// New player parked on the start line.
    pub fn new(id: PlayerId, slot: usize) -> Self {
        Self {
            id,
            slot,
            position: 0.0,
            velocity: 0.0,
            vertical_offset: 0.0,
            vertical_velocity: 0.0,
            airborne: false,
            on_ramp: false,
            laps_completed: 0,
            finished: false,
            rank: None,
            lap_start_tick: 0,
            last_lap_ticks: None,
            best_lap_ticks: None,
            finish_tick: None,
        }
    }

    /// Back to the start line with a fresh lap count.
    pub fn place_on_grid(&mut self, initial_speed: f64) {
        *self = Self {
            velocity: initial_speed,
            ..Self::new(self.id, self.slot)
        };
    }

    /// Button press: add `acceleration`, capped at `max_speed`.
    ///
    /// Ignored while airborne or after finishing.
    pub fn accelerate(&mut self, physics: &PhysicsConfig) {
        if self.finished || self.airborne {
            return;
        }
        self.velocity = (self.velocity + physics.acceleration).min(physics.max_speed);
    }

    /// Brake press: remove `brake` without reversing direction.
    pub fn brake(&mut self, physics: &PhysicsConfig) {
        if self.finished || self.airborne {
            return;
        }
        self.velocity = if self.velocity > 0.0 {
            (self.velocity - physics.brake).max(0.0)
        } else {
            (self.velocity + physics.brake).min(0.0)
        };
    }

    /// Close the current lap at `tick`.
    pub fn record_lap(&mut self, tick: u64) {
        let lap_ticks = tick.saturating_sub(self.lap_start_tick);
        self.last_lap_ticks = Some(lap_ticks);
        self.best_lap_ticks = Some(match self.best_lap_ticks {
            Some(best) => best.min(lap_ticks),
            None => lap_ticks,
        });
        self.lap_start_tick = tick;
    }
}
