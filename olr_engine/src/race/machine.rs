//! Race status transitions.
//!
//! `Idle → Countdown → Racing → Finished`, with `Reset` legal from every
//! status and `Fault` halting a running race into `Finished`.

use olr_common::race::state::RaceStatus;

/// Result of a status transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new status.
    Ok(RaceStatus),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

/// Event that can trigger a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceTrigger {
    /// `start` accepted.
    Start,
    /// Countdown reached zero.
    CountdownElapsed,
    /// Every player on the roster finished.
    AllFinished,
    /// A tick found a broken invariant.
    Fault,
    /// Operator reset.
    Reset,
}

/// Holds the authoritative race status.
#[derive(Debug, Clone, Default)]
pub struct RaceStateMachine {
    state: RaceStatus,
}

impl RaceStateMachine {
    /// Create a state machine in `Idle`.
    pub const fn new() -> Self {
        Self {
            state: RaceStatus::Idle,
        }
    }

    /// Current status.
    #[inline]
    pub const fn state(&self) -> RaceStatus {
        self.state
    }

    /// Attempt a transition given a trigger.
    pub fn handle_event(&mut self, event: RaceTrigger) -> TransitionResult {
        use RaceStatus::*;
        use RaceTrigger::*;

        let next = match (self.state, event) {
            (Idle, Start) => Countdown,
            (Countdown, CountdownElapsed) => Racing,
            (Racing, AllFinished) => Finished,
            (Racing, Fault) => Finished,
            (_, Reset) => Idle,
            _ => {
                return TransitionResult::Rejected(invalid_transition_reason(self.state, event));
            }
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Physics only advances while racing.
    #[inline]
    pub const fn is_racing(&self) -> bool {
        matches!(self.state, RaceStatus::Racing)
    }
}

fn invalid_transition_reason(state: RaceStatus, event: RaceTrigger) -> &'static str {
    use RaceStatus::*;
    use RaceTrigger::*;
    match (state, event) {
        (_, Start) => "Start: only allowed from Idle",
        (_, CountdownElapsed) => "CountdownElapsed: only allowed during Countdown",
        (_, AllFinished) | (_, Fault) => "race is not running",
        (Idle, Reset) | (Countdown, Reset) | (Racing, Reset) | (Finished, Reset) => {
            "Reset is always allowed"
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
