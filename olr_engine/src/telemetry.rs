//! Telemetry snapshots.
//!
//! Read-only view of the race state, assembled by the telemetry task and
//! handed to the external sink. Lap times are converted from ticks to
//! milliseconds using the physics period.

use std::cmp::Ordering;

use olr_common::consts::PlayerId;
use olr_common::race::telemetry::{PlayerSnapshot, TelemetrySnapshot};

use crate::race::{Player, RaceState};

/// Build a snapshot of the current race.
pub fn snapshot(state: &RaceState, physics_period_ms: u64) -> TelemetrySnapshot {
    let to_ms = |ticks: u64| ticks.saturating_mul(physics_period_ms);
    TelemetrySnapshot {
        status: state.status,
        elapsed_ticks: state.elapsed_ticks,
        elapsed_ms: to_ms(state.elapsed_ticks),
        total_laps: state.total_laps,
        leader: leader(state),
        fault: state.fault.bits(),
        players: state
            .players
            .iter()
            .map(|p| PlayerSnapshot {
                id: p.id,
                position: p.position,
                velocity: p.velocity,
                vertical_offset: p.vertical_offset,
                airborne: p.airborne,
                lap: p.laps_completed,
                finished: p.finished,
                rank: p.rank,
                last_lap_ms: p.last_lap_ticks.map(to_ms),
                best_lap_ms: p.best_lap_ticks.map(to_ms),
            })
            .collect(),
    }
}

/// Current leader: best finisher, else most laps, then furthest along,
/// then lowest id.
pub fn leader(state: &RaceState) -> Option<PlayerId> {
    state.players.iter().min_by(|a, b| standing(a, b)).map(|p| p.id)
}

/// Race order, `Less` means ahead.
fn standing(a: &Player, b: &Player) -> Ordering {
    match (a.rank, b.rank) {
        (Some(ra), Some(rb)) => ra.cmp(&rb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b
            .laps_completed
            .cmp(&a.laps_completed)
            .then(b.position.total_cmp(&a.position))
            .then(a.id.cmp(&b.id)),
    }
}
