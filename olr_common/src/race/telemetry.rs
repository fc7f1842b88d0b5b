//! Records handed to the external network layer.

use serde::{Deserialize, Serialize};

use super::error::RaceError;
use super::state::RaceStatus;
use crate::consts::{LapNumber, PlayerId};

/// Per-player part of a telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: f64,
    pub velocity: f64,
    pub vertical_offset: f64,
    pub airborne: bool,
    pub lap: LapNumber,
    pub finished: bool,
    pub rank: Option<u8>,
    /// Duration of the last completed lap [ms].
    pub last_lap_ms: Option<u64>,
    /// Fastest completed lap [ms].
    pub best_lap_ms: Option<u64>,
}

/// Immutable view of the race at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub status: RaceStatus,
    pub elapsed_ticks: u64,
    pub elapsed_ms: u64,
    pub total_laps: LapNumber,
    pub leader: Option<PlayerId>,
    /// Raw `FaultFlags` bits, zero when healthy.
    pub fault: u16,
    pub players: Vec<PlayerSnapshot>,
}

/// Answer to one external command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    pub ok: bool,
    pub command: &'static str,
    pub status: RaceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl CommandReply {
    pub fn success(command: &'static str, status: RaceStatus) -> Self {
        Self {
            ok: true,
            command,
            status,
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(command: &'static str, status: RaceStatus, error: &RaceError) -> Self {
        Self {
            ok: false,
            command,
            status,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}
