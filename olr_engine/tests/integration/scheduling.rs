//! Integration test: scheduler slots against a manual clock.
//!
//! Validates: task periods, fixed task order, late-slot realignment,
//! command replies and telemetry as JSON lines, LED frames per render.

use olr_common::config::OlrConfig;
use olr_common::led::palette_color;
use olr_common::race::state::{RaceEvent, RaceStatus};

use olr_engine::cycle::EngineRunner;
use olr_engine::output::{JsonLines, LedOutput, OutputError};
use olr_engine::render::LedFrame;

/// Keeps every frame it is given.
#[derive(Default)]
struct RecordingStrip {
    frames: Vec<LedFrame>,
}

impl LedOutput for RecordingStrip {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn write_frame(&mut self, frame: &LedFrame) -> Result<(), OutputError> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

type Runner = EngineRunner<RecordingStrip, JsonLines<Vec<u8>>>;

fn runner() -> Runner {
    EngineRunner::new(
        &OlrConfig::default(),
        RecordingStrip::default(),
        JsonLines::new(Vec::new()),
    )
    .unwrap()
}

fn output_lines(runner: &Runner) -> Vec<serde_json::Value> {
    let text = std::str::from_utf8(runner.sink().get_ref()).unwrap();
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn periods_follow_the_configured_rates() {
    let mut r = runner();
    for slot in 0..60 {
        r.run_slot(slot * 50);
    }
    let stats = r.stats();
    assert_eq!(stats.physics_runs, 60);
    assert_eq!(stats.render_runs, 60);
    assert_eq!(stats.telemetry_runs, 3);
    assert_eq!(stats.missed_periods, 0);
    assert_eq!(r.led().frames.len(), 60);
}

#[test]
fn late_slot_runs_once_and_realigns() {
    let mut r = runner();
    r.run_slot(0);
    let report = r.run_slot(500);
    assert!(report.physics && report.render && !report.telemetry);
    assert_eq!(r.stats().physics_runs, 2);
    assert_eq!(r.stats().missed_periods, 18);

    assert!(!r.run_slot(549).physics);
    assert!(r.run_slot(550).physics);
}

#[test]
fn replies_and_snapshots_are_json_lines() {
    let mut r = runner();
    r.handle_line("j1");
    r.handle_line("nonsense");
    r.run_slot(0);

    let lines = output_lines(&r);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["ok"], true);
    assert_eq!(lines[0]["command"], "join");
    assert_eq!(lines[1]["ok"], false);
    assert_eq!(lines[1]["error_kind"], "ParseError");
    assert_eq!(lines[2]["status"], "Idle");
    assert_eq!(lines[2]["players"][0]["id"], 1);
}

#[test]
fn countdown_runs_on_the_physics_task() {
    let mut r = runner();
    r.handle_line("j1");
    r.handle_line("g");

    let mut started_at = None;
    for slot in 0..50u64 {
        let report = r.run_slot(slot * 50);
        if report.events.iter().any(|e| matches!(e, RaceEvent::RaceStarted)) {
            started_at = Some(slot);
            break;
        }
    }
    assert_eq!(started_at, Some(39));
    assert_eq!(r.session().status(), RaceStatus::Racing);
}

#[test]
fn render_sees_the_state_physics_just_settled() {
    let mut r = runner();
    r.handle_line("j1");
    r.handle_line("j2");
    r.run_slot(0);

    let frame = r.frame();
    let brightness = OlrConfig::default().led.brightness;
    // Both players sit on pixel 0; the lower id is drawn.
    assert_eq!(frame.pixel(0), Some(palette_color(0).scale(brightness)));
    assert_eq!(r.led().frames.last(), Some(frame));
}

#[test]
fn json_settings_message_configures_the_next_race() {
    let mut r = runner();
    let reply = r.handle_line(r#"{"type":"config","loopMax":2,"kf":0.01,"kg":0.02,"tail":4}"#);
    assert!(reply.ok);
    assert_eq!(r.session().config().rules.total_laps, 2);
    assert_eq!(r.session().config().physics.friction, 0.01);
    assert_eq!(r.session().config().physics.gravity, 0.02);
    assert_eq!(r.led_config().tail_length, 4);

    r.run_slot(0);
    let lines = output_lines(&r);
    assert_eq!(lines[0]["command"], "configure");
    assert_eq!(lines[1]["total_laps"], 2);
}

#[test]
fn led_test_pattern_reaches_the_strip() {
    let mut r = runner();
    assert!(r.handle_line("t").ok);
    r.run_slot(0);
    r.run_slot(50);

    let frames = &r.led().frames;
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.lit() == f.len()));
    assert_ne!(frames[0], frames[1]);
}

#[test]
fn telemetry_command_is_published_without_waiting() {
    let mut r = runner();
    r.run_slot(0);
    r.handle_line("telemetry");
    r.run_slot(20);

    let snapshots = output_lines(&r)
        .into_iter()
        .filter(|v| v.get("players").is_some())
        .count();
    assert_eq!(snapshots, 2);
}
