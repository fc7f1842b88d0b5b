//! The race record mutated by physics and commands.

use heapless::Vec;

use olr_common::consts::{LapNumber, MAX_PLAYERS_LIMIT, PlayerId};
use olr_common::race::config::TrackConfig;
use olr_common::race::error::FaultFlags;
use olr_common::race::state::{RaceEvent, RaceStatus};

use super::player::Player;

/// Fixed-capacity roster.
pub type Roster = Vec<Player, MAX_PLAYERS_LIMIT>;

/// Worst case per tick: launch, landing, lap and finish for every player,
/// plus `RaceStarted` and `Faulted`.
pub const MAX_TICK_EVENTS: usize = 4 * MAX_PLAYERS_LIMIT + 2;

/// Events produced by one tick, no heap allocation.
pub type TickEvents = Vec<RaceEvent, MAX_TICK_EVENTS>;

/// Single live race record.
#[derive(Debug, Clone)]
pub struct RaceState {
    pub players: Roster,
    pub total_laps: LapNumber,
    pub status: RaceStatus,
    pub elapsed_ticks: u64,
    pub track: TrackConfig,
    /// Non-empty once a tick found a broken invariant.
    pub fault: FaultFlags,
    /// Ranks handed out so far.
    pub finishers: u8,
}

impl RaceState {
    pub fn new(track: TrackConfig, total_laps: LapNumber) -> Self {
        Self {
            players: Roster::new(),
            total_laps,
            status: RaceStatus::Idle,
            elapsed_ticks: 0,
            track,
            fault: FaultFlags::empty(),
            finishers: 0,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// True when the roster is non-empty and everybody finished.
    pub fn all_finished(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.finished)
    }

    /// Clear roster, clock and fault. Track and lap count are kept.
    pub fn clear(&mut self) {
        self.players.clear();
        self.status = RaceStatus::Idle;
        self.elapsed_ticks = 0;
        self.fault = FaultFlags::empty();
        self.finishers = 0;
    }
}
