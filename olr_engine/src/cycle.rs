//! Cooperative scheduler: commands → physics → render → telemetry.
//!
//! ## Tasks
//! Three periodic tasks with independent periods, each run to completion on
//! the owner thread. Within a slot the order is fixed, so render and
//! telemetry always observe the state the physics task just settled.
//!
//! ## Late slots
//! A task that is late by more than one period runs once and realigns to its
//! period grid; the skipped periods are counted in [`CycleStats`].
//!
//! ## Commands
//! Queued command lines are applied only between slots, never while a task
//! is running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use olr_common::config::OlrConfig;
use olr_common::race::config::{LedConfig, TimingConfig};
use olr_common::race::error::RaceError;
use olr_common::race::state::RaceStatus;
use olr_common::race::telemetry::CommandReply;

use crate::command::{Command, dispatch, parse_failure};
use crate::output::{LedOutput, TelemetrySink};
use crate::race::{RaceSession, TickEvents};
use crate::render::{LedFrame, render_into, test_pattern_into};
use crate::telemetry;

/// Slots between two scheduler diagnostics lines.
pub const DIAG_INTERVAL_SLOTS: u64 = 200;

/// Render slots the strip test pattern runs for.
pub const TEST_PATTERN_SLOTS: u32 = 40;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-slot timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Slots in which at least one task ran.
    pub slot_count: u64,
    /// Last slot duration [ns].
    pub last_slot_ns: u64,
    /// Minimum slot duration [ns].
    pub min_slot_ns: u64,
    /// Maximum slot duration [ns].
    pub max_slot_ns: u64,
    /// Running sum for average computation.
    pub sum_slot_ns: u64,
    pub physics_runs: u64,
    pub render_runs: u64,
    pub telemetry_runs: u64,
    /// Whole periods skipped because a slot started late.
    pub missed_periods: u64,
    /// LED or telemetry writes that failed.
    pub output_errors: u64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            slot_count: 0,
            last_slot_ns: 0,
            min_slot_ns: u64::MAX,
            max_slot_ns: 0,
            sum_slot_ns: 0,
            physics_runs: 0,
            render_runs: 0,
            telemetry_runs: 0,
            missed_periods: 0,
            output_errors: 0,
        }
    }

    /// Record a slot duration.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.slot_count += 1;
        self.last_slot_ns = duration_ns;
        self.min_slot_ns = self.min_slot_ns.min(duration_ns);
        self.max_slot_ns = self.max_slot_ns.max(duration_ns);
        self.sum_slot_ns = self.sum_slot_ns.saturating_add(duration_ns);
    }

    /// Average slot time [ns] (0 if no slots).
    #[inline]
    pub fn avg_slot_ns(&self) -> u64 {
        if self.slot_count == 0 {
            0
        } else {
            self.sum_slot_ns / self.slot_count
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Periodic Tasks ─────────────────────────────────────────────────

/// The scheduled tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Physics,
    Render,
    Telemetry,
}

/// Fixed-period timer on a millisecond grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    period_ms: u64,
    next_due_ms: u64,
}

impl PeriodicTask {
    /// First run due at `start_ms`.
    pub const fn new(period_ms: u64, start_ms: u64) -> Self {
        Self {
            period_ms,
            next_due_ms: start_ms,
        }
    }

    #[inline]
    pub const fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_due_ms
    }

    #[inline]
    pub const fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// Mark the task as run at `now_ms` and schedule the next period.
    ///
    /// Returns how many whole periods were skipped.
    pub fn complete(&mut self, now_ms: u64) -> u64 {
        let period = self.period_ms.max(1);
        let missed = now_ms.saturating_sub(self.next_due_ms) / period;
        self.next_due_ms += (missed + 1) * period;
        missed
    }
}

/// Which tasks are due in a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueTasks {
    pub physics: bool,
    pub render: bool,
    pub telemetry: bool,
}

impl DueTasks {
    pub const fn any(&self) -> bool {
        self.physics || self.render || self.telemetry
    }
}

/// Timers of the three tasks.
#[derive(Debug, Clone)]
pub struct Scheduler {
    physics: PeriodicTask,
    render: PeriodicTask,
    telemetry: PeriodicTask,
}

impl Scheduler {
    /// All tasks first due at `start_ms`.
    pub fn new(timing: &TimingConfig, start_ms: u64) -> Self {
        Self {
            physics: PeriodicTask::new(timing.physics_period_ms, start_ms),
            render: PeriodicTask::new(timing.led_period_ms, start_ms),
            telemetry: PeriodicTask::new(timing.telemetry_period_ms, start_ms),
        }
    }

    pub fn due(&self, now_ms: u64) -> DueTasks {
        DueTasks {
            physics: self.physics.is_due(now_ms),
            render: self.render.is_due(now_ms),
            telemetry: self.telemetry.is_due(now_ms),
        }
    }

    pub fn complete(&mut self, task: Task, now_ms: u64) -> u64 {
        match task {
            Task::Physics => self.physics.complete(now_ms),
            Task::Render => self.render.complete(now_ms),
            Task::Telemetry => self.telemetry.complete(now_ms),
        }
    }

    /// Earliest time any task becomes due.
    pub fn next_wake_ms(&self) -> u64 {
        self.physics
            .next_due_ms()
            .min(self.render.next_due_ms())
            .min(self.telemetry.next_due_ms())
    }
}

// ─── Engine Runner ──────────────────────────────────────────────────

/// What one slot did.
#[derive(Debug, Clone, Default)]
pub struct SlotReport {
    pub physics: bool,
    pub render: bool,
    pub telemetry: bool,
    /// Events of the physics tick, empty if it did not run.
    pub events: TickEvents,
}

/// Owns the session, the outputs and the timers.
pub struct EngineRunner<L: LedOutput, T: TelemetrySink> {
    session: RaceSession,
    scheduler: Scheduler,
    led_config: LedConfig,
    physics_period_ms: u64,
    frame: LedFrame,
    led: L,
    sink: T,
    stats: CycleStats,
    telemetry_requested: bool,
    /// Render slots left in the strip test pattern.
    test_slots_left: u32,
    test_step: usize,
    running: Arc<AtomicBool>,
}

impl<L: LedOutput, T: TelemetrySink> EngineRunner<L, T> {
    /// Build the session and pre-allocate the frame buffer.
    pub fn new(config: &OlrConfig, led: L, sink: T) -> Result<Self, RaceError> {
        let session = RaceSession::from_config(config)?;
        Ok(Self {
            session,
            scheduler: Scheduler::new(&config.timing, 0),
            led_config: config.led,
            physics_period_ms: config.timing.physics_period_ms,
            frame: LedFrame::new(config.led.strip_length),
            led,
            sink,
            stats: CycleStats::new(),
            telemetry_requested: false,
            test_slots_left: 0,
            test_step: 0,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    #[inline]
    pub fn session(&self) -> &RaceSession {
        &self.session
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub fn frame(&self) -> &LedFrame {
        &self.frame
    }

    /// LED settings in force, including runtime changes.
    #[inline]
    pub fn led_config(&self) -> &LedConfig {
        &self.led_config
    }

    #[inline]
    pub fn led(&self) -> &L {
        &self.led
    }

    #[inline]
    pub fn sink(&self) -> &T {
        &self.sink
    }

    /// Flag that stops [`run`](Self::run) when cleared.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Apply one command line and publish the reply.
    pub fn handle_line(&mut self, line: &str) -> CommandReply {
        let reply = match line.parse::<Command>() {
            Ok(command) => {
                let reply = dispatch(&mut self.session, &mut self.led_config, command);
                match command {
                    Command::Telemetry => self.telemetry_requested = true,
                    Command::LedTest if reply.ok => {
                        self.test_slots_left = TEST_PATTERN_SLOTS;
                        self.test_step = 0;
                    }
                    _ => {}
                }
                reply
            }
            Err(e) => parse_failure(&e, self.session.status()),
        };
        if let Err(e) = self.sink.publish_reply(&reply) {
            self.stats.output_errors += 1;
            warn!("Reply not delivered: {e}");
        }
        reply
    }

    /// Run every task due at `now_ms`.
    pub fn run_slot(&mut self, now_ms: u64) -> SlotReport {
        let due = self.scheduler.due(now_ms);
        let mut report = SlotReport::default();
        if !due.any() && !self.telemetry_requested {
            return report;
        }
        let slot_start = Instant::now();

        // ═══ PHYSICS ═══
        if due.physics {
            report.events = self.session.tick();
            self.stats.missed_periods += self.scheduler.complete(Task::Physics, now_ms);
            self.stats.physics_runs += 1;
            report.physics = true;
        }

        // ═══ RENDER ═══
        if due.render {
            if self.test_slots_left > 0 && self.session.status() == RaceStatus::Idle {
                test_pattern_into(&self.led_config, self.test_step, &mut self.frame);
                self.test_step += 1;
                self.test_slots_left -= 1;
            } else {
                self.test_slots_left = 0;
                render_into(self.session.state(), &self.led_config, &mut self.frame);
            }
            if let Err(e) = self.led.write_frame(&self.frame) {
                self.stats.output_errors += 1;
                warn!("LED output '{}' failed: {e}", self.led.name());
            }
            self.stats.missed_periods += self.scheduler.complete(Task::Render, now_ms);
            self.stats.render_runs += 1;
            report.render = true;
        }

        // ═══ TELEMETRY ═══
        if due.telemetry || self.telemetry_requested {
            self.publish_telemetry();
            if due.telemetry {
                self.stats.missed_periods += self.scheduler.complete(Task::Telemetry, now_ms);
            }
            self.telemetry_requested = false;
            self.stats.telemetry_runs += 1;
            report.telemetry = true;
        }

        self.stats.record(slot_start.elapsed().as_nanos() as u64);
        if self.stats.slot_count % DIAG_INTERVAL_SLOTS == 0 {
            debug!(
                "Scheduler: {} slots, avg={}ns max={}ns missed={} output_errors={}",
                self.stats.slot_count,
                self.stats.avg_slot_ns(),
                self.stats.max_slot_ns,
                self.stats.missed_periods,
                self.stats.output_errors,
            );
        }
        report
    }

    fn publish_telemetry(&mut self) {
        let snapshot = telemetry::snapshot(self.session.state(), self.physics_period_ms);
        if let Err(e) = self.sink.publish_snapshot(&snapshot) {
            self.stats.output_errors += 1;
            warn!("Telemetry sink failed: {e}");
        }
    }

    /// Run slots against the wall clock until the running flag clears.
    ///
    /// Command lines from `commands` are applied between slots. A closed
    /// channel leaves the race running without input.
    pub fn run(&mut self, commands: &Receiver<String>) {
        let epoch = Instant::now();
        let now_ms = || epoch.elapsed().as_millis() as u64;
        let mut input_open = true;

        while self.running.load(Ordering::SeqCst) {
            while input_open {
                match commands.try_recv() {
                    Ok(line) => {
                        self.handle_line(&line);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("Command input closed");
                        input_open = false;
                    }
                }
            }

            self.run_slot(now_ms());

            let wait = Duration::from_millis(self.scheduler.next_wake_ms().saturating_sub(now_ms()));
            if wait.is_zero() {
                continue;
            }
            if input_open {
                match commands.recv_timeout(wait) {
                    Ok(line) => {
                        self.handle_line(&line);
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        info!("Command input closed");
                        input_open = false;
                    }
                }
            } else {
                std::thread::sleep(wait);
            }
        }

        info!(
            "Scheduler stopped: {} slots, physics={} render={} telemetry={} missed={} avg={}ns max={}ns",
            self.stats.slot_count,
            self.stats.physics_runs,
            self.stats.render_runs,
            self.stats.telemetry_runs,
            self.stats.missed_periods,
            self.stats.avg_slot_ns(),
            self.stats.max_slot_ns,
        );
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
