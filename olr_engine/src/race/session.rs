//! Race session: the single owner of the race state.
//!
//! Commands are applied between scheduler slots and are validated before
//! anything changes: on error the state is untouched and the error is
//! returned to the caller. [`RaceSession::tick`] is the physics task body.

use tracing::{debug, error, info, warn};

use olr_common::config::OlrConfig;
use olr_common::consts::PlayerId;
use olr_common::race::config::{RaceConfig, RampConfig};
use olr_common::race::error::RaceError;
use olr_common::race::state::{RaceEvent, RaceStatus};

use super::machine::{RaceStateMachine, RaceTrigger, TransitionResult};
use super::player::Player;
use super::state::{RaceState, TickEvents};
use crate::physics;

/// Per-race physics tuning, accepted while `Idle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tuning {
    Acceleration(f64),
    MaxSpeed(f64),
    InitialSpeed(f64),
}

/// Ramp switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampSwitch {
    On,
    Off,
    Toggle,
}

/// Owns the race state, its configuration and the countdown.
#[derive(Debug, Clone)]
pub struct RaceSession {
    config: RaceConfig,
    machine: RaceStateMachine,
    state: RaceState,
    countdown_ticks: u32,
    countdown_remaining: u32,
    /// Geometry restored when the ramp is switched back on.
    ramp_geometry: RampConfig,
    /// Events raised by commands, delivered with the next tick.
    pending: TickEvents,
}

impl RaceSession {
    /// Create an idle race.
    ///
    /// # Errors
    /// `InvalidConfiguration` if any section or the track geometry is invalid.
    pub fn new(config: RaceConfig, countdown_ticks: u32) -> Result<Self, RaceError> {
        config.validate().map_err(RaceError::InvalidConfiguration)?;
        Ok(Self {
            config,
            machine: RaceStateMachine::new(),
            state: RaceState::new(config.track, config.rules.total_laps),
            countdown_ticks,
            countdown_remaining: 0,
            ramp_geometry: config.track.ramp.unwrap_or_default(),
            pending: TickEvents::new(),
        })
    }

    /// Create an idle race from the full engine configuration.
    pub fn from_config(config: &OlrConfig) -> Result<Self, RaceError> {
        Self::new(config.race_config(), config.timing.countdown_ticks())
    }

    #[inline]
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &RaceState {
        &self.state
    }

    #[inline]
    pub fn status(&self) -> RaceStatus {
        self.machine.state()
    }

    /// Physics ticks left before the green light.
    #[inline]
    pub fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Replace rules, track and physics of an idle race.
    ///
    /// On error the previous configuration stays in force.
    pub fn configure(&mut self, config: RaceConfig) -> Result<RaceStatus, RaceError> {
        self.require_idle("configure")?;
        config.validate().map_err(RaceError::InvalidConfiguration)?;
        if self.state.players.len() > config.rules.max_players as usize {
            return Err(RaceError::InvalidConfiguration(format!(
                "max_players {} is below the current roster of {}",
                config.rules.max_players,
                self.state.players.len()
            )));
        }
        if let Some(player) = self
            .state
            .players
            .iter()
            .find(|p| p.id > config.rules.max_players)
        {
            return Err(RaceError::InvalidConfiguration(format!(
                "max_players {} is below joined player id {}",
                config.rules.max_players, player.id
            )));
        }
        self.config = config;
        if let Some(ramp) = config.track.ramp {
            self.ramp_geometry = ramp;
        }
        self.state.track = config.track;
        self.state.total_laps = config.rules.total_laps;
        info!(
            "Race reconfigured: {} laps, track length {}",
            config.rules.total_laps, config.track.length
        );
        Ok(self.status())
    }

    /// Add a player to the roster.
    pub fn join(&mut self, id: PlayerId) -> Result<RaceStatus, RaceError> {
        let status = self.status();
        if !status.accepts_join() {
            return Err(RaceError::InvalidTransition {
                command: "join",
                status,
            });
        }
        let max = self.config.rules.max_players;
        if self.state.players.len() >= max as usize {
            return Err(RaceError::RosterFull { max });
        }
        if id == 0 || id > max {
            return Err(RaceError::PlayerOutOfRange { id, max });
        }
        if self.state.player(id).is_some() {
            return Err(RaceError::DuplicatePlayer(id));
        }

        let mut player = Player::new(id, self.state.players.len());
        player.place_on_grid(self.config.physics.initial_speed);
        self.state
            .players
            .push(player)
            .map_err(|_| RaceError::RosterFull { max })?;
        info!(
            "Player {id} joined ({}/{max})",
            self.state.players.len()
        );
        Ok(status)
    }

    /// Put everybody on the grid and start the countdown.
    pub fn start(&mut self) -> Result<RaceStatus, RaceError> {
        self.require_idle("start")?;
        if self.state.players.is_empty() {
            return Err(RaceError::EmptyRoster);
        }

        let initial_speed = self.config.physics.initial_speed;
        for player in self.state.players.iter_mut() {
            player.place_on_grid(initial_speed);
        }
        self.state.elapsed_ticks = 0;
        self.state.finishers = 0;
        self.state.fault = Default::default();

        self.apply(RaceTrigger::Start);
        self.countdown_remaining = self.countdown_ticks;
        info!(
            "Race start: {} players, {} laps, countdown {} ticks",
            self.state.players.len(),
            self.state.total_laps,
            self.countdown_ticks
        );
        if self.countdown_ticks == 0 && self.apply(RaceTrigger::CountdownElapsed) {
            info!("Green light");
            physics::emit(&mut self.pending, RaceEvent::RaceStarted);
        }
        Ok(self.status())
    }

    /// Back to `Idle` with an empty roster. Always legal.
    pub fn reset(&mut self) -> RaceStatus {
        self.apply(RaceTrigger::Reset);
        self.state.clear();
        self.countdown_remaining = 0;
        self.pending.clear();
        info!("Race reset");
        self.status()
    }

    /// Accelerate press for `id`. Ignored while airborne or after finishing.
    pub fn accelerate(&mut self, id: PlayerId) -> Result<RaceStatus, RaceError> {
        let physics = self.config.physics;
        self.racing_player(id, "accelerate")?.accelerate(&physics);
        Ok(self.status())
    }

    /// Brake press for `id`. Ignored while airborne or after finishing.
    pub fn brake(&mut self, id: PlayerId) -> Result<RaceStatus, RaceError> {
        let physics = self.config.physics;
        self.racing_player(id, "brake")?.brake(&physics);
        Ok(self.status())
    }

    /// Adjust one physics parameter of an idle race.
    pub fn tune(&mut self, tuning: Tuning) -> Result<RaceStatus, RaceError> {
        self.require_idle("tune")?;
        let mut config = self.config;
        match tuning {
            Tuning::Acceleration(value) => config.physics.acceleration = value,
            Tuning::MaxSpeed(value) => config.physics.max_speed = value,
            Tuning::InitialSpeed(value) => config.physics.initial_speed = value,
        }
        config.validate().map_err(RaceError::InvalidConfiguration)?;
        self.config = config;
        let initial_speed = config.physics.initial_speed;
        for player in self.state.players.iter_mut() {
            player.place_on_grid(initial_speed);
        }
        debug!("Physics tuned: {tuning:?}");
        Ok(self.status())
    }

    /// Switch the ramp of an idle race on or off.
    ///
    /// Switching on restores the last configured geometry, which must fit
    /// the current track.
    pub fn switch_ramp(&mut self, switch: RampSwitch) -> Result<RaceStatus, RaceError> {
        let enable = match switch {
            RampSwitch::On => true,
            RampSwitch::Off => false,
            RampSwitch::Toggle => self.config.track.ramp.is_none(),
        };
        let mut config = self.config;
        config.track.ramp = enable.then_some(self.ramp_geometry);
        let status = self.configure(config)?;
        info!("Ramp {}", if enable { "on" } else { "off" });
        Ok(status)
    }

    /// Gate for the LED test pattern: only while idle.
    pub fn led_test(&self) -> Result<RaceStatus, RaceError> {
        self.require_idle("test")?;
        Ok(self.status())
    }

    // ─── Physics Task ───────────────────────────────────────────────

    /// One physics tick: count down, or advance the race.
    ///
    /// Events raised by commands since the last tick come first.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = core::mem::take(&mut self.pending);
        match self.status() {
            RaceStatus::Countdown => self.tick_countdown(&mut events),
            RaceStatus::Racing => self.tick_racing(&mut events),
            RaceStatus::Idle | RaceStatus::Finished => {}
        }
        events
    }

    fn tick_countdown(&mut self, events: &mut TickEvents) {
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining == 0 && self.apply(RaceTrigger::CountdownElapsed) {
            info!("Green light");
            physics::emit(events, RaceEvent::RaceStarted);
        }
    }

    fn tick_racing(&mut self, events: &mut TickEvents) {
        for event in physics::advance(&mut self.state, &self.config.physics).iter() {
            log_event(event);
            physics::emit(events, *event);
        }

        if !self.state.fault.is_empty() {
            error!(
                "Race halted at tick {}: fault {:?}",
                self.state.elapsed_ticks, self.state.fault
            );
            self.apply(RaceTrigger::Fault);
        } else if self.state.all_finished() {
            info!("All players finished after {} ticks", self.state.elapsed_ticks);
            self.apply(RaceTrigger::AllFinished);
        }
    }

    // ─── Helpers ────────────────────────────────────────────────────

    /// Run a transition and mirror the result into the race state.
    fn apply(&mut self, trigger: RaceTrigger) -> bool {
        match self.machine.handle_event(trigger) {
            TransitionResult::Ok(next) => {
                self.state.status = next;
                true
            }
            TransitionResult::Rejected(reason) => {
                warn!("Transition {trigger:?} rejected: {reason}");
                false
            }
        }
    }

    fn require_idle(&self, command: &'static str) -> Result<(), RaceError> {
        match self.status() {
            RaceStatus::Idle => Ok(()),
            status => Err(RaceError::InvalidTransition { command, status }),
        }
    }

    fn racing_player(
        &mut self,
        id: PlayerId,
        command: &'static str,
    ) -> Result<&mut Player, RaceError> {
        if !self.machine.is_racing() {
            return Err(RaceError::InvalidTransition {
                command,
                status: self.status(),
            });
        }
        self.state
            .player_mut(id)
            .ok_or(RaceError::UnknownPlayer(id))
    }
}

fn log_event(event: &RaceEvent) {
    match *event {
        RaceEvent::LapCompleted { player, lap } => info!("Player {player} completed lap {lap}"),
        RaceEvent::RaceFinished { player, rank } => info!("Player {player} finished, rank {rank}"),
        RaceEvent::RampLaunch {
            player,
            vertical_velocity,
        } => debug!("Player {player} launched from ramp (vz={vertical_velocity:.4})"),
        RaceEvent::Landed { player } => debug!("Player {player} landed"),
        RaceEvent::RaceStarted | RaceEvent::Faulted { .. } => {}
    }
}
