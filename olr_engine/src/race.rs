//! Race ownership: players, the race state, the status state machine and the
//! session that applies commands.
//!
//! - [`player`] - Per-player physical and lap state
//! - [`state`] - `RaceState`, the single mutable race record
//! - [`machine`] - Status transition table
//! - [`session`] - Command entry points and the per-tick driver

pub mod machine;
pub mod player;
pub mod session;
pub mod state;

pub use machine::{RaceStateMachine, RaceTrigger, TransitionResult};
pub use player::Player;
pub use session::{RaceSession, RampSwitch, Tuning};
pub use state::{MAX_TICK_EVENTS, RaceState, Roster, TickEvents};
