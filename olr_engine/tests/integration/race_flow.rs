//! Integration test: complete races driven through the command protocol.
//!
//! Validates: config TOML → session → join/start → countdown → racing →
//! laps and finish ranks → Finished → reset.

use olr_common::race::config::LedConfig;
use olr_common::race::error::RaceError;
use olr_common::race::state::{RaceEvent, RaceStatus};

use olr_engine::command::{Command, dispatch};
use olr_engine::config::{ConfigOverrides, load_config_from_str};
use olr_engine::physics::apply_friction;
use olr_engine::race::RaceSession;
use olr_engine::telemetry;

// ── Configs ─────────────────────────────────────────────────────────

/// Short flat track, two laps, default countdown (40 ticks).
const SHORT_TRACK_TOML: &str = r#"
[race]
total_laps = 2
max_players = 4

[track]
length = 10.0
"#;

/// The coasting scenario: one player released at 1.0 with no input.
const COASTING_TOML: &str = r#"
[timing]
countdown_ms = 0

[race]
total_laps = 5

[track]
length = 35.0

[physics]
friction = 0.006
initial_speed = 1.0
"#;

fn session_from(toml: &str) -> RaceSession {
    let config = load_config_from_str(toml, &ConfigOverrides::default()).unwrap();
    RaceSession::from_config(&config).unwrap()
}

fn send(session: &mut RaceSession, line: &str) -> bool {
    let command: Command = line.parse().unwrap();
    dispatch(session, &mut LedConfig::default(), command).ok
}

// ── Full race ───────────────────────────────────────────────────────

#[test]
fn two_player_race_runs_to_finish() {
    let mut session = session_from(SHORT_TRACK_TOML);
    assert!(send(&mut session, "j1"));
    assert!(send(&mut session, "j2"));
    assert!(send(&mut session, "g"));
    assert_eq!(session.status(), RaceStatus::Countdown);
    assert_eq!(session.countdown_remaining(), 40);

    // Inputs are refused until the green light.
    assert!(!send(&mut session, "a"));

    let mut started = 0;
    for _ in 0..40 {
        for event in session.tick().iter() {
            if matches!(event, RaceEvent::RaceStarted) {
                started += 1;
            }
        }
    }
    assert_eq!(started, 1);
    assert_eq!(session.status(), RaceStatus::Racing);

    let mut laps = 0;
    let mut finishes = Vec::new();
    let mut tick = 0u32;
    while session.status() == RaceStatus::Racing && tick < 5_000 {
        assert!(send(&mut session, "a"));
        if tick % 3 == 0 {
            assert!(send(&mut session, "2"));
        }
        for event in session.tick().iter() {
            match *event {
                RaceEvent::LapCompleted { .. } => laps += 1,
                RaceEvent::RaceFinished { player, rank } => finishes.push((player, rank)),
                RaceEvent::Faulted { flags } => panic!("fault {flags:#x}"),
                _ => {}
            }
        }
        tick += 1;
    }

    assert_eq!(session.status(), RaceStatus::Finished);
    assert_eq!(laps, 4);
    assert_eq!(finishes, vec![(1, 1), (2, 2)]);
    assert!(session.state().fault.is_empty());

    let snap = telemetry::snapshot(session.state(), 50);
    assert_eq!(snap.status, RaceStatus::Finished);
    assert_eq!(snap.leader, Some(1));
    assert!(snap.players.iter().all(|p| p.finished && p.lap == 2));
    assert!(snap.players[0].best_lap_ms.is_some());

    // Finished races ignore ticks and refuse inputs.
    assert!(session.tick().is_empty());
    assert!(!send(&mut session, "a"));

    assert!(send(&mut session, "r"));
    assert_eq!(session.status(), RaceStatus::Idle);
    assert!(session.state().players.is_empty());
}

#[test]
fn coasting_player_wraps_exactly_once() {
    let mut session = session_from(COASTING_TOML);
    session.join(1).unwrap();
    assert_eq!(session.start(), Ok(RaceStatus::Racing));

    let mut velocity = 1.0;
    let mut expected = 0.0;
    let mut laps = 0;
    for _ in 0..40 {
        velocity = apply_friction(velocity, 0.006);
        expected += velocity;
        for event in session.tick().iter() {
            if let RaceEvent::LapCompleted { player, lap } = *event {
                assert_eq!(player, 1);
                laps += 1;
                assert_eq!(lap, laps);
            }
        }
    }

    assert_eq!(laps, 1);
    let player = session.state().player(1).unwrap();
    assert_eq!(player.laps_completed, 1);
    assert!((player.position - (expected % 35.0)).abs() < 1e-9);
}

// ── Rejections ──────────────────────────────────────────────────────

#[test]
fn fifth_join_is_refused_and_roster_stays_at_four() {
    let mut session = session_from(SHORT_TRACK_TOML);
    for id in 1..=4 {
        session.join(id).unwrap();
    }
    assert_eq!(session.join(5), Err(RaceError::RosterFull { max: 4 }));
    assert_eq!(session.state().players.len(), 4);
}

#[test]
fn out_of_range_player_ids_are_refused() {
    let mut session = session_from(SHORT_TRACK_TOML);
    assert!(!send(&mut session, "j0"));
    assert!(!send(&mut session, "join 255"));
    assert!(!send(&mut session, "j5"));
    assert!(session.state().players.is_empty());
    assert_eq!(
        session.join(0),
        Err(RaceError::PlayerOutOfRange { id: 0, max: 4 })
    );

    assert!(send(&mut session, "j4"));
    assert_eq!(session.state().players.len(), 1);
}

#[test]
fn ramp_can_be_switched_off_between_races() {
    let toml = r#"
[timing]
countdown_ms = 0

[race]
total_laps = 1
"#;
    let mut session = session_from(toml);
    assert!(session.config().track.ramp.is_some());
    assert!(send(&mut session, "1"));
    assert!(session.state().track.ramp.is_none());

    session.join(1).unwrap();
    session.start().unwrap();
    assert!(!send(&mut session, "1"));

    let mut launches = 0;
    for _ in 0..3_000 {
        if session.status() != RaceStatus::Racing {
            break;
        }
        session.accelerate(1).unwrap();
        launches += session
            .tick()
            .iter()
            .filter(|e| matches!(e, RaceEvent::RampLaunch { .. }))
            .count();
    }
    assert_eq!(launches, 0);
    assert_eq!(session.status(), RaceStatus::Finished);
}

#[test]
fn start_while_racing_is_an_invalid_transition() {
    let mut session = session_from(COASTING_TOML);
    session.join(1).unwrap();
    session.start().unwrap();
    assert_eq!(session.status(), RaceStatus::Racing);

    assert_eq!(
        session.start(),
        Err(RaceError::InvalidTransition {
            command: "start",
            status: RaceStatus::Racing,
        })
    );
    assert_eq!(session.status(), RaceStatus::Racing);
}

#[test]
fn reversed_ramp_is_rejected_when_loading() {
    let toml = r#"
[track]
length = 35.0

[track.ramp]
start = 20.0
center = 15.0
end = 10.0
height = 12.0
"#;
    assert!(load_config_from_str(toml, &ConfigOverrides::default()).is_err());
}

#[test]
fn join_during_countdown_is_accepted() {
    let mut session = session_from(SHORT_TRACK_TOML);
    session.join(1).unwrap();
    session.start().unwrap();
    assert_eq!(session.join(2), Ok(RaceStatus::Countdown));
    assert_eq!(session.state().players.len(), 2);
}

#[test]
fn tuning_is_limited_to_idle() {
    let mut session = session_from(SHORT_TRACK_TOML);
    assert!(send(&mut session, "m15"));
    assert_eq!(session.config().physics.max_speed, 1.5);
    assert!(send(&mut session, "j1"));
    assert!(send(&mut session, "g"));
    assert!(!send(&mut session, "m20"));
    assert_eq!(session.config().physics.max_speed, 1.5);
}

#[test]
fn ramp_track_race_lands_every_launch() {
    let toml = r#"
[timing]
countdown_ms = 0

[race]
total_laps = 3

[track]
length = 35.0

[track.ramp]
start = 10.0
center = 15.0
end = 20.0
height = 12.0
"#;
    let mut session = session_from(toml);
    session.join(1).unwrap();
    session.start().unwrap();

    let mut launches = 0;
    let mut landings = 0;
    for _ in 0..3_000 {
        if session.status() != RaceStatus::Racing {
            break;
        }
        session.accelerate(1).unwrap();
        for event in session.tick().iter() {
            match *event {
                RaceEvent::RampLaunch { .. } => launches += 1,
                RaceEvent::Landed { .. } => landings += 1,
                RaceEvent::Faulted { flags } => panic!("fault {flags:#x}"),
                _ => {}
            }
        }
        assert!(session.state().player(1).unwrap().vertical_offset >= 0.0);
    }
    assert_eq!(session.status(), RaceStatus::Finished);
    assert_eq!(launches, landings);
}
