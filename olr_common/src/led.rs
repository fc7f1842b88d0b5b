//! Pixel colours.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PLAYERS_LIMIT;

/// One 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `level / 255`.
    #[inline]
    pub const fn scale(self, level: u8) -> Self {
        Self {
            r: scale8(self.r, level),
            g: scale8(self.g, level),
            b: scale8(self.b, level),
        }
    }

    /// Channel-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self {
            r: self.r.max(other.r),
            g: self.g.max(other.g),
            b: self.b.max(other.b),
        }
    }

    #[inline]
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

#[inline]
const fn scale8(channel: u8, level: u8) -> u8 {
    ((channel as u16 * level as u16) / 255) as u8
}

/// Player colours by join slot.
pub const PLAYER_PALETTE: [Rgb; MAX_PLAYERS_LIMIT] = [
    Rgb::new(255, 0, 255), // magenta
    Rgb::new(0, 255, 0),   // green
    Rgb::new(0, 0, 255),   // blue
    Rgb::new(255, 255, 0), // yellow
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 128, 0),
    Rgb::new(255, 255, 255),
];

/// Colour of the player in `slot`, wrapping past the palette.
#[inline]
pub const fn palette_color(slot: usize) -> Rgb {
    PLAYER_PALETTE[slot % MAX_PLAYERS_LIMIT]
}
