//! Command errors and tick fault flags.
//!
//! [`RaceError`] is returned synchronously to the command caller; the race
//! state is left untouched. [`FaultFlags`] record invariant violations found
//! inside a tick; any flag halts the race.

use bitflags::bitflags;
use serde::Serialize;
use thiserror::Error;

use super::state::RaceStatus;
use crate::consts::PlayerId;

/// Errors surfaced to the caller of a race command.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RaceError {
    /// Malformed geometry or physics parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Join beyond `max_players`.
    #[error("roster full ({max} players)")]
    RosterFull { max: u8 },

    /// Command not legal in the current status.
    #[error("{command} not allowed while {status}")]
    InvalidTransition {
        command: &'static str,
        status: RaceStatus,
    },

    /// Command names a player that is not on the roster.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// Player id outside `1..=max_players`.
    #[error("player id {id} out of range [1, {max}]")]
    PlayerOutOfRange { id: PlayerId, max: u8 },

    /// Join with an id already on the roster.
    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    /// Start with nobody on the roster.
    #[error("cannot start with an empty roster")]
    EmptyRoster,
}

impl RaceError {
    /// Stable machine-readable name.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "InvalidConfiguration",
            Self::RosterFull { .. } => "RosterFull",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::UnknownPlayer(_) => "UnknownPlayer",
            Self::PlayerOutOfRange { .. } => "PlayerOutOfRange",
            Self::DuplicatePlayer(_) => "DuplicatePlayer",
            Self::EmptyRoster => "EmptyRoster",
        }
    }
}

bitflags! {
    /// Invariant violations detected while advancing physics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FaultFlags: u16 {
        /// Position, velocity or vertical state became NaN or infinite.
        const NON_FINITE_STATE     = 0x0001;
        /// Vertical offset below ground after the landing clamp.
        const NEGATIVE_ALTITUDE    = 0x0002;
        /// Position outside `[0, length)` after the lap wrap.
        const POSITION_OUT_OF_RANGE = 0x0004;
        /// More laps than the race has.
        const LAP_OVERFLOW         = 0x0008;
        /// Friction flipped the sign of a velocity.
        const VELOCITY_REVERSAL    = 0x0010;
    }
}

impl Default for FaultFlags {
    fn default() -> Self {
        Self::empty()
    }
}
