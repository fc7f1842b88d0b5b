//! LED renderer.
//!
//! Pure function of the race state: every render rebuilds the whole frame,
//! so calling it twice on the same state yields identical frames.
//!
//! ## Layers (bottom to top)
//! 1. Ramp glow: dim blue, brightest at the ramp crest.
//! 2. Tails: fading pixels behind each moving, unfinished player, merged by
//!    channel-wise max.
//! 3. Heads: one pixel per player; on collision the lowest player id wins.
//!
//! The global brightness is applied to every pixel last.
//!
//! `test_pattern_into` replaces all layers with shifting palette bands.

use olr_common::consts::PlayerId;
use olr_common::led::{Rgb, palette_color};
use olr_common::race::config::LedConfig;

use crate::race::RaceState;

/// Ramp glow colour at the crest, before brightness.
pub const RAMP_GLOW: Rgb = Rgb::new(0, 0, 40);

/// Intensity lost per tail pixel.
pub const TAIL_FADE_STEP: usize = 60;

// ─── Frame ──────────────────────────────────────────────────────────

/// Full pixel buffer for one render tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedFrame {
    pixels: Vec<Rgb>,
}

impl LedFrame {
    /// All-black frame of `len` pixels.
    pub fn new(len: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    /// Number of pixels that are not black.
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|p| !p.is_black()).count()
    }
}

// ─── Mapping ────────────────────────────────────────────────────────

/// Strip pixel of a track position: `floor(position / length * strip)`,
/// clamped to the strip.
#[inline]
pub fn pixel_index(position: f64, track_length: f64, strip_length: usize) -> usize {
    if strip_length == 0 {
        return 0;
    }
    let raw = (position / track_length * strip_length as f64).floor();
    if raw > 0.0 {
        (raw as usize).min(strip_length - 1)
    } else {
        0
    }
}

// ─── Render ─────────────────────────────────────────────────────────

/// Render the race onto a fresh frame.
pub fn render(state: &RaceState, led: &LedConfig) -> LedFrame {
    let mut frame = LedFrame::new(led.strip_length);
    render_into(state, led, &mut frame);
    frame
}

/// Render the race into an existing frame, overwriting every pixel.
pub fn render_into(state: &RaceState, led: &LedConfig, frame: &mut LedFrame) {
    let len = led.strip_length;
    frame.pixels.clear();
    frame.pixels.resize(len, Rgb::BLACK);
    if len == 0 {
        return;
    }
    let track = &state.track;
    let head_of = |position: f64| pixel_index(position, track.length, len);

    if let Some(ramp) = track.ramp {
        for (i, px) in frame.pixels.iter_mut().enumerate() {
            let x = (i as f64 + 0.5) / len as f64 * track.length;
            let level = ramp.profile(x);
            if level > 0.0 {
                *px = RAMP_GLOW.scale((level * 255.0) as u8);
            }
        }
    }

    let tail = led.tail_length.min(len - 1);
    for player in state.players.iter().filter(|p| !p.finished && p.velocity > 0.0) {
        let head = head_of(player.position);
        let color = palette_color(player.slot);
        for k in 1..=tail {
            let index = (head + len - k) % len;
            let fade = 255usize.saturating_sub(k * TAIL_FADE_STEP) as u8;
            frame.pixels[index] = frame.pixels[index].max(color.scale(fade));
        }
    }

    for player in state.players.iter() {
        let head = head_of(player.position);
        if !lower_id_on_pixel(state, player.id, head, &head_of) {
            frame.pixels[head] = palette_color(player.slot);
        }
    }

    for px in frame.pixels.iter_mut() {
        *px = px.scale(led.brightness);
    }
}

// ─── Test Pattern ───────────────────────────────────────────────────

/// Pixels per colour band of the strip test pattern.
pub const TEST_BAND_WIDTH: usize = 4;

/// Strip self-test: bands of the player palette, shifted one pixel per
/// `step`. Brightness applies as for race frames.
pub fn test_pattern_into(led: &LedConfig, step: usize, frame: &mut LedFrame) {
    frame.pixels.clear();
    frame.pixels.extend(
        (0..led.strip_length)
            .map(|i| palette_color((i + step) / TEST_BAND_WIDTH).scale(led.brightness)),
    );
}

fn lower_id_on_pixel(
    state: &RaceState,
    id: PlayerId,
    pixel: usize,
    head_of: &impl Fn(f64) -> usize,
) -> bool {
    state
        .players
        .iter()
        .any(|other| other.id < id && head_of(other.position) == pixel)
}
