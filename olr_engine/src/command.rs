//! Text command protocol.
//!
//! One command per line. Both the single-key controller codes and readable
//! words are accepted:
//!
//! | Line                  | Command                     |
//! |-----------------------|-----------------------------|
//! | `g`, `start`          | start                       |
//! | `r`, `reset`          | reset                       |
//! | `s`, `status`         | status                      |
//! | `p`, `telemetry`      | publish telemetry now       |
//! | `j<n>`, `join <n>`    | join player `n`             |
//! | `a` `2` `d` `f`       | accelerate players 1..4     |
//! | `l` `z` `c` `b`       | brake players 1..4          |
//! | `accel <n>`, `brake <n>` | accelerate / brake player `n` |
//! | `a<N>`                | acceleration = N / 100      |
//! | `m<N>`                | max speed = N / 10          |
//! | `i<N>`                | initial speed = N / 100     |
//! | `1`, `ramp [on\|off]` | toggle / switch the ramp    |
//! | `t`, `test`           | LED strip test pattern      |
//! | `laps <n>`            | laps to win                 |
//! | `friction <x>`        | friction per tick           |
//! | `gravity <x>`         | gravity per tick            |
//! | `tail <n>`            | tail length in pixels       |
//!
//! A line starting with `{` is a JSON settings message:
//! `{"type":"config","loopMax":3,"acel":0.2,"kf":0.006,"kg":0.015,"tail":3}`.
//! Unknown keys are ignored. Settings apply only while idle, all at once or
//! not at all.

use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

use olr_common::consts::{LapNumber, PlayerId};
use olr_common::race::config::LedConfig;
use olr_common::race::error::RaceError;
use olr_common::race::state::RaceStatus;
use olr_common::race::telemetry::CommandReply;

use crate::race::{RaceSession, RampSwitch, Tuning};

/// Settings changed together by one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, alias = "loopMax")]
    pub laps: Option<LapNumber>,
    #[serde(default, alias = "acel")]
    pub acceleration: Option<f64>,
    #[serde(default, alias = "kf")]
    pub friction: Option<f64>,
    #[serde(default, alias = "kg")]
    pub gravity: Option<f64>,
    #[serde(default, alias = "tail")]
    pub tail_length: Option<usize>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonCommand {
    Config(ConfigUpdate),
}

/// Parsed external command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Join(PlayerId),
    Start,
    Reset,
    Status,
    Telemetry,
    Accelerate(PlayerId),
    Brake(PlayerId),
    Tune(Tuning),
    Ramp(RampSwitch),
    LedTest,
    Configure(ConfigUpdate),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Start => "start",
            Self::Reset => "reset",
            Self::Status => "status",
            Self::Telemetry => "telemetry",
            Self::Accelerate(_) => "accelerate",
            Self::Brake(_) => "brake",
            Self::Tune(_) => "tune",
            Self::Ramp(_) => "ramp",
            Self::LedTest => "test",
            Self::Configure(_) => "configure",
        }
    }
}

/// Malformed command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("malformed JSON command: {0}")]
    Json(String),
    #[error("invalid argument for {command}: '{value}'")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.starts_with('{') {
            return match serde_json::from_str::<JsonCommand>(line) {
                Ok(JsonCommand::Config(update)) => Ok(Self::Configure(update)),
                Err(e) => Err(ParseError::Json(e.to_string())),
            };
        }
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseError::Empty);
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(ParseError::Unknown(line.to_string()));
        }

        match (head, arg) {
            ("g" | "start", None) => Ok(Self::Start),
            ("r" | "reset", None) => Ok(Self::Reset),
            ("s" | "status", None) => Ok(Self::Status),
            ("p" | "telemetry", None) => Ok(Self::Telemetry),
            ("join", Some(id)) => Ok(Self::Join(parse_id("join", id)?)),
            ("accel", Some(id)) => Ok(Self::Accelerate(parse_id("accelerate", id)?)),
            ("brake", Some(id)) => Ok(Self::Brake(parse_id("brake", id)?)),
            ("1" | "ramp", None) => Ok(Self::Ramp(RampSwitch::Toggle)),
            ("ramp", Some("on")) => Ok(Self::Ramp(RampSwitch::On)),
            ("ramp", Some("off")) => Ok(Self::Ramp(RampSwitch::Off)),
            ("t" | "test", None) => Ok(Self::LedTest),
            ("laps", Some(v)) => Ok(Self::Configure(ConfigUpdate {
                laps: Some(parse_value("laps", v)?),
                ..Default::default()
            })),
            ("friction", Some(v)) => Ok(Self::Configure(ConfigUpdate {
                friction: Some(parse_value("friction", v)?),
                ..Default::default()
            })),
            ("gravity", Some(v)) => Ok(Self::Configure(ConfigUpdate {
                gravity: Some(parse_value("gravity", v)?),
                ..Default::default()
            })),
            ("tail", Some(v)) => Ok(Self::Configure(ConfigUpdate {
                tail_length: Some(parse_value("tail", v)?),
                ..Default::default()
            })),
            (word, None) => parse_compact(word),
            _ => Err(ParseError::Unknown(line.to_string())),
        }
    }
}

/// Single-word controller codes.
fn parse_compact(word: &str) -> Result<Command, ParseError> {
    let button = match word {
        "a" => Some(Command::Accelerate(1)),
        "2" => Some(Command::Accelerate(2)),
        "d" => Some(Command::Accelerate(3)),
        "f" => Some(Command::Accelerate(4)),
        "l" => Some(Command::Brake(1)),
        "z" => Some(Command::Brake(2)),
        "c" => Some(Command::Brake(3)),
        "b" => Some(Command::Brake(4)),
        _ => None,
    };
    if let Some(command) = button {
        return Ok(command);
    }

    let mut chars = word.chars();
    let prefix = chars.next();
    let rest = chars.as_str();
    match prefix {
        Some('j') => Ok(Command::Join(parse_id("join", rest)?)),
        Some('a') => Ok(Command::Tune(Tuning::Acceleration(
            parse_scaled("acceleration", rest, 100.0)?,
        ))),
        Some('m') => Ok(Command::Tune(Tuning::MaxSpeed(parse_scaled(
            "max speed",
            rest,
            10.0,
        )?))),
        Some('i') => Ok(Command::Tune(Tuning::InitialSpeed(parse_scaled(
            "initial speed",
            rest,
            100.0,
        )?))),
        _ => Err(ParseError::Unknown(word.to_string())),
    }
}

fn parse_id(command: &'static str, value: &str) -> Result<PlayerId, ParseError> {
    parse_value(command, value)
}

fn parse_value<T: FromStr>(command: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}

fn parse_scaled(command: &'static str, value: &str, divisor: f64) -> Result<f64, ParseError> {
    value
        .parse::<u32>()
        .map(|n| f64::from(n) / divisor)
        .map_err(|_| ParseError::InvalidArgument {
            command,
            value: value.to_string(),
        })
}

// ─── Dispatch ───────────────────────────────────────────────────────

/// Apply a command to the session and the LED settings, and build the reply.
pub fn dispatch(session: &mut RaceSession, led: &mut LedConfig, command: Command) -> CommandReply {
    let name = command.name();
    let result = match command {
        Command::Join(id) => session.join(id),
        Command::Start => session.start(),
        Command::Reset => Ok(session.reset()),
        Command::Status | Command::Telemetry => Ok(session.status()),
        Command::Accelerate(id) => session.accelerate(id),
        Command::Brake(id) => session.brake(id),
        Command::Tune(tuning) => session.tune(tuning),
        Command::Ramp(switch) => session.switch_ramp(switch),
        Command::LedTest => session.led_test(),
        Command::Configure(update) => apply_update(session, led, &update),
    };
    match result {
        Ok(status) => {
            trace!("Command {name} ok ({status})");
            CommandReply::success(name, status)
        }
        Err(e) => {
            debug!("Command {name} rejected: {e}");
            CommandReply::failure(name, session.status(), &e)
        }
    }
}

/// Apply a settings update to an idle race.
///
/// Everything is validated before anything changes.
pub fn apply_update(
    session: &mut RaceSession,
    led: &mut LedConfig,
    update: &ConfigUpdate,
) -> Result<RaceStatus, RaceError> {
    let mut next_led = *led;
    if let Some(tail_length) = update.tail_length {
        next_led.tail_length = tail_length;
    }
    next_led
        .validate()
        .map_err(|e| RaceError::InvalidConfiguration(format!("led: {e}")))?;

    let mut config = *session.config();
    if let Some(laps) = update.laps {
        config.rules.total_laps = laps;
    }
    if let Some(acceleration) = update.acceleration {
        config.physics.acceleration = acceleration;
    }
    if let Some(friction) = update.friction {
        config.physics.friction = friction;
    }
    if let Some(gravity) = update.gravity {
        config.physics.gravity = gravity;
    }

    let status = session.configure(config)?;
    *led = next_led;
    Ok(status)
}

/// Reply for a line that did not parse.
pub fn parse_failure(error: &ParseError, status: RaceStatus) -> CommandReply {
    CommandReply {
        ok: false,
        command: "unknown",
        status,
        error: Some(error.to_string()),
        error_kind: Some("ParseError"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olr_common::race::config::RaceConfig;

    fn parse(line: &str) -> Result<Command, ParseError> {
        line.parse()
    }

    #[test]
    fn lifecycle_codes_and_words() {
        assert_eq!(parse("g"), Ok(Command::Start));
        assert_eq!(parse("start"), Ok(Command::Start));
        assert_eq!(parse(" r \n"), Ok(Command::Reset));
        assert_eq!(parse("status"), Ok(Command::Status));
        assert_eq!(parse("p"), Ok(Command::Telemetry));
    }

    #[test]
    fn join_forms() {
        assert_eq!(parse("j3"), Ok(Command::Join(3)));
        assert_eq!(parse("join 7"), Ok(Command::Join(7)));
        assert!(matches!(
            parse("join x"),
            Err(ParseError::InvalidArgument { command: "join", .. })
        ));
        assert!(matches!(parse("j999"), Err(ParseError::InvalidArgument { .. })));
    }

    #[test]
    fn controller_buttons() {
        assert_eq!(parse("a"), Ok(Command::Accelerate(1)));
        assert_eq!(parse("2"), Ok(Command::Accelerate(2)));
        assert_eq!(parse("d"), Ok(Command::Accelerate(3)));
        assert_eq!(parse("f"), Ok(Command::Accelerate(4)));
        assert_eq!(parse("l"), Ok(Command::Brake(1)));
        assert_eq!(parse("z"), Ok(Command::Brake(2)));
        assert_eq!(parse("c"), Ok(Command::Brake(3)));
        assert_eq!(parse("b"), Ok(Command::Brake(4)));
        assert_eq!(parse("accel 6"), Ok(Command::Accelerate(6)));
        assert_eq!(parse("brake 6"), Ok(Command::Brake(6)));
    }

    #[test]
    fn tuning_codes_are_scaled() {
        assert_eq!(parse("a25"), Ok(Command::Tune(Tuning::Acceleration(0.25))));
        assert_eq!(parse("m15"), Ok(Command::Tune(Tuning::MaxSpeed(1.5))));
        assert_eq!(parse("i10"), Ok(Command::Tune(Tuning::InitialSpeed(0.1))));
        assert!(matches!(parse("m-1"), Err(ParseError::InvalidArgument { .. })));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert!(matches!(parse("warp"), Err(ParseError::Unknown(_))));
        assert!(matches!(parse("join 1 2"), Err(ParseError::Unknown(_))));
        assert!(matches!(parse("é"), Err(ParseError::Unknown(_))));
    }

    #[test]
    fn ramp_and_test_codes() {
        assert_eq!(parse("1"), Ok(Command::Ramp(RampSwitch::Toggle)));
        assert_eq!(parse("ramp"), Ok(Command::Ramp(RampSwitch::Toggle)));
        assert_eq!(parse("ramp on"), Ok(Command::Ramp(RampSwitch::On)));
        assert_eq!(parse("ramp off"), Ok(Command::Ramp(RampSwitch::Off)));
        assert!(matches!(parse("ramp up"), Err(ParseError::Unknown(_))));
        assert_eq!(parse("t"), Ok(Command::LedTest));
        assert_eq!(parse("test"), Ok(Command::LedTest));
    }

    #[test]
    fn settings_words() {
        assert_eq!(
            parse("laps 3"),
            Ok(Command::Configure(ConfigUpdate {
                laps: Some(3),
                ..Default::default()
            }))
        );
        assert_eq!(
            parse("friction 0.01"),
            Ok(Command::Configure(ConfigUpdate {
                friction: Some(0.01),
                ..Default::default()
            }))
        );
        assert_eq!(
            parse("gravity 0.02"),
            Ok(Command::Configure(ConfigUpdate {
                gravity: Some(0.02),
                ..Default::default()
            }))
        );
        assert_eq!(
            parse("tail 6"),
            Ok(Command::Configure(ConfigUpdate {
                tail_length: Some(6),
                ..Default::default()
            }))
        );
        assert!(matches!(
            parse("laps many"),
            Err(ParseError::InvalidArgument { command: "laps", .. })
        ));
    }

    #[test]
    fn json_config_message() {
        let line = r#"{"type":"config","maxLed":100,"loopMax":3,"acel":0.3,"kf":0.01,"kg":0.02,"tail":5}"#;
        assert_eq!(
            parse(line),
            Ok(Command::Configure(ConfigUpdate {
                laps: Some(3),
                acceleration: Some(0.3),
                friction: Some(0.01),
                gravity: Some(0.02),
                tail_length: Some(5),
            }))
        );
        assert_eq!(
            parse(r#"{"type":"config","laps":2}"#),
            Ok(Command::Configure(ConfigUpdate {
                laps: Some(2),
                ..Default::default()
            }))
        );
        assert!(matches!(parse(r#"{"type":"state"}"#), Err(ParseError::Json(_))));
        assert!(matches!(parse("{nope"), Err(ParseError::Json(_))));
    }

    #[test]
    fn dispatch_settings_apply_atomically_while_idle() {
        let mut session = RaceSession::new(RaceConfig::default(), 40).unwrap();
        let mut led = LedConfig::default();

        let update = ConfigUpdate {
            laps: Some(3),
            friction: Some(0.01),
            gravity: Some(0.02),
            tail_length: Some(6),
            ..Default::default()
        };
        let reply = dispatch(&mut session, &mut led, Command::Configure(update));
        assert!(reply.ok);
        assert_eq!(reply.command, "configure");
        assert_eq!(session.config().rules.total_laps, 3);
        assert_eq!(session.state().total_laps, 3);
        assert_eq!(session.config().physics.friction, 0.01);
        assert_eq!(session.config().physics.gravity, 0.02);
        assert_eq!(led.tail_length, 6);

        // Valid laps with an invalid gravity change nothing.
        let bad = ConfigUpdate {
            laps: Some(7),
            gravity: Some(0.0),
            ..Default::default()
        };
        let reply = dispatch(&mut session, &mut led, Command::Configure(bad));
        assert!(!reply.ok);
        assert_eq!(reply.error_kind, Some("InvalidConfiguration"));
        assert_eq!(session.config().rules.total_laps, 3);

        let too_long = ConfigUpdate {
            tail_length: Some(500),
            ..Default::default()
        };
        assert!(!dispatch(&mut session, &mut led, Command::Configure(too_long)).ok);
        assert_eq!(led.tail_length, 6);

        dispatch(&mut session, &mut led, Command::Join(1));
        dispatch(&mut session, &mut led, Command::Start);
        let reply = dispatch(&mut session, &mut led, parse("tail 2").unwrap());
        assert_eq!(reply.error_kind, Some("InvalidTransition"));
        assert_eq!(led.tail_length, 6);
    }

    #[test]
    fn dispatch_ramp_and_led_test() {
        let mut session = RaceSession::new(RaceConfig::default(), 40).unwrap();
        let mut led = LedConfig::default();

        let reply = dispatch(&mut session, &mut led, Command::Ramp(RampSwitch::Toggle));
        assert!(reply.ok);
        assert_eq!(session.config().track.ramp, None);
        assert!(dispatch(&mut session, &mut led, Command::Ramp(RampSwitch::On)).ok);
        assert!(session.config().track.ramp.is_some());

        let reply = dispatch(&mut session, &mut led, Command::LedTest);
        assert!(reply.ok);
        assert_eq!(reply.command, "test");

        dispatch(&mut session, &mut led, Command::Join(1));
        dispatch(&mut session, &mut led, Command::Start);
        let reply = dispatch(&mut session, &mut led, Command::LedTest);
        assert_eq!(reply.error_kind, Some("InvalidTransition"));
    }

    #[test]
    fn dispatch_rejects_out_of_range_join() {
        let mut session = RaceSession::new(RaceConfig::default(), 40).unwrap();
        let mut led = LedConfig::default();
        for line in ["j0", "join 255"] {
            let reply = dispatch(&mut session, &mut led, parse(line).unwrap());
            assert!(!reply.ok);
            assert_eq!(reply.error_kind, Some("PlayerOutOfRange"));
        }
        assert!(session.state().players.is_empty());
    }

    #[test]
    fn dispatch_reports_status_and_errors() {
        let mut session = RaceSession::new(RaceConfig::default(), 40).unwrap();
        let mut led = LedConfig::default();

        let reply = dispatch(&mut session, &mut led, Command::Join(1));
        assert!(reply.ok);
        assert_eq!(reply.command, "join");
        assert_eq!(reply.status, RaceStatus::Idle);

        let reply = dispatch(&mut session, &mut led, Command::Accelerate(1));
        assert!(!reply.ok);
        assert_eq!(reply.error_kind, Some("InvalidTransition"));
        assert_eq!(reply.status, RaceStatus::Idle);

        let reply = dispatch(&mut session, &mut led, Command::Start);
        assert!(reply.ok);
        assert_eq!(reply.status, RaceStatus::Countdown);

        let reply = dispatch(&mut session, &mut led, Command::Reset);
        assert!(reply.ok);
        assert_eq!(reply.status, RaceStatus::Idle);
    }

    #[test]
    fn parse_failure_reply_serializes() {
        let reply = parse_failure(&ParseError::Unknown("warp".into()), RaceStatus::Idle);
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains("\"ok\":false"));
        assert!(json.contains("ParseError"));
        assert!(json.contains("warp"));
    }
}
