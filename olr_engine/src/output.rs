//! Output boundaries: LED driver and telemetry sink.
//!
//! The engine only knows these traits. A failing output is logged by the
//! scheduler and never stops the tick loop.

use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use olr_common::led::Rgb;
use olr_common::race::telemetry::{CommandReply, TelemetrySnapshot};

use crate::render::LedFrame;

/// Failure of an output driver.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("frame of {got} pixels does not fit a strip of {expected}")]
    FrameSize { expected: usize, got: usize },
}

// ─── LED ────────────────────────────────────────────────────────────

/// Physical (or simulated) LED strip.
pub trait LedOutput {
    /// Driver name for logs.
    fn name(&self) -> &'static str;

    /// Push a complete frame to the strip.
    fn write_frame(&mut self, frame: &LedFrame) -> Result<(), OutputError>;
}

/// Strip driver that logs an ASCII picture of each frame at `trace` level.
///
/// Used when no hardware is attached.
#[derive(Debug, Clone)]
pub struct TraceStrip {
    pin: u8,
    strip_length: usize,
    frames: u64,
}

impl TraceStrip {
    pub fn new(pin: u8, strip_length: usize) -> Self {
        Self {
            pin,
            strip_length,
            frames: 0,
        }
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl LedOutput for TraceStrip {
    fn name(&self) -> &'static str {
        "trace-strip"
    }

    fn write_frame(&mut self, frame: &LedFrame) -> Result<(), OutputError> {
        if frame.len() != self.strip_length {
            return Err(OutputError::FrameSize {
                expected: self.strip_length,
                got: frame.len(),
            });
        }
        self.frames += 1;
        trace!(pin = self.pin, frame = self.frames, "{}", ascii_strip(frame));
        Ok(())
    }
}

/// One character per pixel: `.` dark, `~` dim, `#` lit.
pub fn ascii_strip(frame: &LedFrame) -> String {
    frame.pixels().iter().map(|&px| pixel_glyph(px)).collect()
}

fn pixel_glyph(px: Rgb) -> char {
    match px.r.max(px.g).max(px.b) {
        0 => '.',
        1..=63 => '~',
        _ => '#',
    }
}

// ─── Telemetry ──────────────────────────────────────────────────────

/// Consumer of telemetry snapshots and command replies.
pub trait TelemetrySink {
    fn publish_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), OutputError>;

    fn publish_reply(&mut self, reply: &CommandReply) -> Result<(), OutputError>;
}

/// Writes every record as one JSON line.
#[derive(Debug)]
pub struct JsonLines<W: Write> {
    writer: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record<T: Serialize>(&mut self, record: &T) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> TelemetrySink for JsonLines<W> {
    fn publish_snapshot(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), OutputError> {
        self.write_record(snapshot)
    }

    fn publish_reply(&mut self, reply: &CommandReply) -> Result<(), OutputError> {
        self.write_record(reply)
    }
}
