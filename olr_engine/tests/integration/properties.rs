//! Property tests: physics and render invariants under random input.

use proptest::prelude::*;

use olr_common::race::config::{LedConfig, PhysicsConfig, TrackConfig};
use olr_common::race::state::{RaceEvent, RaceStatus};

use olr_engine::physics::{advance, apply_friction};
use olr_engine::race::{Player, RaceState};
use olr_engine::render::render;
use olr_engine::telemetry::snapshot;

const TOTAL_LAPS: u8 = 3;

/// Racing state on the default ramp track.
fn racing_state(velocities: &[f64]) -> RaceState {
    let mut state = RaceState::new(TrackConfig::default(), TOTAL_LAPS);
    for (slot, &velocity) in velocities.iter().enumerate() {
        let mut player = Player::new(slot as u8 + 1, slot);
        player.velocity = velocity;
        state.players.push(player).unwrap();
    }
    state.status = RaceStatus::Racing;
    state
}

/// 0 = no input, 1 = accelerate, 2 = brake.
fn press(state: &mut RaceState, physics: &PhysicsConfig, slot: usize, action: u8) {
    let Some(player) = state.players.get_mut(slot) else {
        return;
    };
    match action {
        1 => player.accelerate(physics),
        2 => player.brake(physics),
        _ => {}
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_friction_never_reverses(
        velocity in -5.0f64..5.0,
        friction in 0.0f64..1.0,
    ) {
        let next = apply_friction(velocity, friction);
        prop_assert!(next * velocity >= 0.0);
        prop_assert!(next.abs() <= velocity.abs());
    }

    #[test]
    fn prop_race_invariants_hold(
        velocities in prop::collection::vec(0.0f64..1.9, 1..=4),
        inputs in prop::collection::vec((0usize..4, 0u8..3), 0..600),
    ) {
        let physics = PhysicsConfig::default();
        let mut state = racing_state(&velocities);

        for &(slot, action) in &inputs {
            press(&mut state, &physics, slot, action);
            let laps_before: Vec<u8> = state.players.iter().map(|p| p.laps_completed).collect();

            let events = advance(&mut state, &physics);

            prop_assert!(state.fault.is_empty(), "fault {:?}", state.fault);
            for (player, &before) in state.players.iter().zip(&laps_before) {
                prop_assert!(player.vertical_offset >= 0.0);
                prop_assert!(player.velocity >= 0.0);
                prop_assert!(player.laps_completed >= before);
                prop_assert!(player.laps_completed - before <= 1);

                let lap_events = events
                    .iter()
                    .filter(|e| matches!(e, RaceEvent::LapCompleted { player: id, .. } if *id == player.id))
                    .count();
                prop_assert_eq!(lap_events, usize::from(player.laps_completed - before));
            }
        }

        let mut ranks: Vec<u8> = state.players.iter().filter_map(|p| p.rank).collect();
        ranks.sort_unstable();
        let expected: Vec<u8> = (1..=ranks.len() as u8).collect();
        prop_assert_eq!(ranks, expected);
        prop_assert_eq!(usize::from(state.finishers), state.players.iter().filter(|p| p.finished).count());
        for player in state.players.iter() {
            prop_assert_eq!(player.finished, player.rank.is_some());
            prop_assert_eq!(player.finished, player.laps_completed == TOTAL_LAPS);
        }
    }

    #[test]
    fn prop_render_is_pure(
        velocities in prop::collection::vec(0.0f64..1.9, 1..=4),
        ticks in 0usize..200,
        strip_length in 1usize..300,
        tail_length in 0usize..8,
    ) {
        let physics = PhysicsConfig::default();
        let mut state = racing_state(&velocities);
        for _ in 0..ticks {
            advance(&mut state, &physics);
        }
        let led = LedConfig {
            strip_length,
            tail_length,
            ..LedConfig::default()
        };

        let before = snapshot(&state, 50);
        let first = render(&state, &led);
        let second = render(&state, &led);
        prop_assert_eq!(first.len(), strip_length);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(before, snapshot(&state, 50));
    }
}
