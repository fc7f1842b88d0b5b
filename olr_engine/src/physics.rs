//! Fixed-tick race physics.
//!
//! ## Per-player order
//! 1. Ramp entry: launch on entering `[start, end)` while grounded.
//! 2. Horizontal: friction towards zero (never past it), then position.
//! 3. Vertical (airborne only): gravity, then offset; land at or below zero.
//! 4. Lap wrap: subtract the track length and count exactly one lap.
//!
//! Players that complete their final lap in the same tick are ranked by
//! descending velocity, then ascending id. After the players are moved every
//! invariant is checked; a violation sets [`FaultFlags`] on the race and
//! emits [`RaceEvent::Faulted`].
//!
//! ## Ramp launch
//! The launch vertical velocity is bounded so that the discrete flight lasts
//! at most `floor((end - position) / speed)` ticks, which keeps the landing
//! point at or before `end` because friction only slows the player down.
//! Within that bound the impulse grows with the ramp height:
//!
//! ```text
//! ceiling = gravity * (window + 1) / 2
//! v0      = ceiling * height / (height + RAMP_HEIGHT_REFERENCE)
//! ```

use heapless::Vec;

use olr_common::consts::{DEFAULT_RAMP_HEIGHT, LapNumber, MAX_PLAYERS_LIMIT};
use olr_common::race::config::{PhysicsConfig, RampConfig, TrackConfig};
use olr_common::race::error::FaultFlags;
use olr_common::race::state::{RaceEvent, RaceStatus};

use crate::race::{Player, RaceState, TickEvents};

/// Ramp height at which a launch uses half of the available flight window.
pub const RAMP_HEIGHT_REFERENCE: f64 = DEFAULT_RAMP_HEIGHT;

// ─── Tick ───────────────────────────────────────────────────────────

/// Advance every non-finished player by one tick.
///
/// No-op returning no events unless the race is `Racing`. Status changes are
/// left to the caller.
pub fn advance(state: &mut RaceState, physics: &PhysicsConfig) -> TickEvents {
    let mut events = TickEvents::new();
    if state.status != RaceStatus::Racing {
        return events;
    }

    state.elapsed_ticks += 1;
    let tick = state.elapsed_ticks;
    let track = state.track;
    let total_laps = state.total_laps;

    let mut finishers: Vec<usize, MAX_PLAYERS_LIMIT> = Vec::new();
    let mut fault = FaultFlags::empty();

    for (index, player) in state.players.iter_mut().enumerate() {
        if player.finished {
            continue;
        }
        let entry_velocity = player.velocity;

        // 1. Ramp entry
        if let Some(ramp) = track.ramp {
            if let Some(vertical_velocity) = enter_ramp(player, &ramp, physics.gravity) {
                emit(
                    &mut events,
                    RaceEvent::RampLaunch {
                        player: player.id,
                        vertical_velocity,
                    },
                );
            }
        }

        // 2. Horizontal
        player.velocity = apply_friction(player.velocity, physics.friction);
        player.position += player.velocity;
        if player.position < 0.0 {
            // Start gate: no driving backwards through the line.
            player.position = 0.0;
            player.velocity = 0.0;
        }

        // 3. Vertical
        if player.airborne && integrate_vertical(player, physics.gravity) {
            emit(&mut events, RaceEvent::Landed { player: player.id });
        }

        // 4. Lap wrap
        if player.position >= track.length {
            player.position -= track.length;
            player.laps_completed = player.laps_completed.saturating_add(1);
            player.record_lap(tick);
            emit(
                &mut events,
                RaceEvent::LapCompleted {
                    player: player.id,
                    lap: player.laps_completed,
                },
            );
            if player.laps_completed == total_laps {
                player.finished = true;
                player.finish_tick = Some(tick);
                let pushed = finishers.push(index).is_ok();
                debug_assert!(pushed, "finisher buffer holds the whole roster");
            }
        }

        fault |= check_invariants(player, entry_velocity, &track, total_laps);
    }

    rank_finishers(state, &mut finishers, &mut events);

    if !fault.is_empty() {
        state.fault |= fault;
        emit(
            &mut events,
            RaceEvent::Faulted {
                flags: state.fault.bits(),
            },
        );
    }

    events
}

/// Append to a tick's event buffer.
#[inline]
pub(crate) fn emit(events: &mut TickEvents, event: RaceEvent) {
    let pushed = events.push(event).is_ok();
    debug_assert!(pushed, "tick event buffer sized for the worst case");
}

// ─── Horizontal ─────────────────────────────────────────────────────

/// Reduce `|velocity|` by `friction`, stopping at zero.
#[inline]
pub fn apply_friction(velocity: f64, friction: f64) -> f64 {
    if velocity.abs() <= friction {
        0.0
    } else {
        velocity - friction * velocity.signum()
    }
}

// ─── Ramp & Vertical ────────────────────────────────────────────────

/// Launch vertical velocity for a player entering `ramp` at `position`.
///
/// `None` when the player is not moving forward or would cross the whole
/// remaining ramp within a single tick.
pub fn launch_velocity(ramp: &RampConfig, position: f64, speed: f64, gravity: f64) -> Option<f64> {
    if speed <= 0.0 || gravity <= 0.0 {
        return None;
    }
    let window = ((ramp.end - position) / speed).floor();
    if window < 1.0 {
        return None;
    }
    let ceiling = gravity * (window + 1.0) / 2.0;
    Some(ceiling * ramp.height / (ramp.height + RAMP_HEIGHT_REFERENCE))
}

/// Launch the player if it just crossed into the ramp.
fn enter_ramp(player: &mut Player, ramp: &RampConfig, gravity: f64) -> Option<f64> {
    let inside = ramp.contains(player.position);
    let entering = inside && !player.on_ramp;
    player.on_ramp = inside;

    if !entering || player.airborne {
        return None;
    }
    let vertical_velocity = launch_velocity(ramp, player.position, player.velocity, gravity)?;
    player.airborne = true;
    player.vertical_offset = 0.0;
    player.vertical_velocity = vertical_velocity;
    Some(vertical_velocity)
}

/// One step of ballistic flight. Returns true on touchdown.
fn integrate_vertical(player: &mut Player, gravity: f64) -> bool {
    player.vertical_velocity -= gravity;
    player.vertical_offset += player.vertical_velocity;
    if player.vertical_offset <= 0.0 && player.vertical_velocity <= 0.0 {
        player.vertical_offset = 0.0;
        player.vertical_velocity = 0.0;
        player.airborne = false;
        return true;
    }
    false
}

// ─── Finish Ranking ─────────────────────────────────────────────────

fn rank_finishers(
    state: &mut RaceState,
    finishers: &mut Vec<usize, MAX_PLAYERS_LIMIT>,
    events: &mut TickEvents,
) {
    let players = &state.players;
    finishers.sort_unstable_by(|&a, &b| {
        let (pa, pb) = (&players[a], &players[b]);
        pb.velocity
            .total_cmp(&pa.velocity)
            .then(pa.id.cmp(&pb.id))
    });

    for &index in finishers.iter() {
        state.finishers += 1;
        let rank = state.finishers;
        let player = &mut state.players[index];
        player.rank = Some(rank);
        emit(
            events,
            RaceEvent::RaceFinished {
                player: player.id,
                rank,
            },
        );
    }
}

// ─── Invariants ─────────────────────────────────────────────────────

/// Check one player after a tick.
pub fn check_invariants(
    player: &Player,
    entry_velocity: f64,
    track: &TrackConfig,
    total_laps: LapNumber,
) -> FaultFlags {
    let mut flags = FaultFlags::empty();
    let values = [
        player.position,
        player.velocity,
        player.vertical_offset,
        player.vertical_velocity,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        flags |= FaultFlags::NON_FINITE_STATE;
    }
    if player.vertical_offset < 0.0 {
        flags |= FaultFlags::NEGATIVE_ALTITUDE;
    }
    if !(0.0..track.length).contains(&player.position) {
        flags |= FaultFlags::POSITION_OUT_OF_RANGE;
    }
    if player.laps_completed > total_laps {
        flags |= FaultFlags::LAP_OVERFLOW;
    }
    if entry_velocity * player.velocity < 0.0 {
        flags |= FaultFlags::VELOCITY_REVERSAL;
    }
    flags
}

// ─── Tests ──────────────────────────────────────────────────────────
