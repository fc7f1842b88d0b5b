//! Race status and race events.
//!
//! `RaceStatus` uses `#[repr(u8)]` so it can travel as a single byte to
//! the external network layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::consts::{LapNumber, PlayerId};

// ─── Status ─────────────────────────────────────────────────────────

/// Race lifecycle status.
///
/// `Idle → Countdown → Racing → Finished`, and back to `Idle` on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum RaceStatus {
    /// Roster open, nothing moving.
    #[default]
    Idle = 0,
    /// Start accepted, waiting for the green light.
    Countdown = 1,
    /// Physics running.
    Racing = 2,
    /// All players finished, or the race was halted by a fault.
    Finished = 3,
}

impl RaceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Countdown => "Countdown",
            Self::Racing => "Racing",
            Self::Finished => "Finished",
        }
    }

    /// Roster changes are only accepted before the race starts moving.
    #[inline]
    pub const fn accepts_join(self) -> bool {
        matches!(self, Self::Idle | Self::Countdown)
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Events ─────────────────────────────────────────────────────────

/// Something that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RaceEvent {
    /// Countdown elapsed, physics now running.
    RaceStarted,
    /// Player left the ground at a ramp.
    RampLaunch {
        player: PlayerId,
        vertical_velocity: f64,
    },
    /// Player touched down again.
    Landed { player: PlayerId },
    /// Player crossed the start line.
    LapCompleted { player: PlayerId, lap: LapNumber },
    /// Player completed the final lap.
    RaceFinished { player: PlayerId, rank: u8 },
    /// An invariant broke; the race is halted.
    Faulted { flags: u16 },
}
