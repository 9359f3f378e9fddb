//! RGBA colours with hex and X11-name parsing.
//!
//! Colours appear in configuration as strings, either `#rrggbb`, `#rrggbbaa`
//! or one of a small set of X11 colour names (`"white"`, `"lime green"`, …),
//! so settings written for Tk-style colour pickers keep working.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a colour string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised colour {0:?}: expected #rrggbb, #rrggbbaa or an X11 colour name")]
pub struct ColorParseError(pub String);

/// An 8-bit-per-channel RGBA colour. Alpha `255` is fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// X11 colour names accepted in configuration.
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0x00, 0x00, 0x00)),
    ("white", (0xFF, 0xFF, 0xFF)),
    ("red", (0xFF, 0x00, 0x00)),
    ("green", (0x00, 0xFF, 0x00)),
    ("blue", (0x00, 0x00, 0xFF)),
    ("yellow", (0xFF, 0xFF, 0x00)),
    ("cyan", (0x00, 0xFF, 0xFF)),
    ("magenta", (0xFF, 0x00, 0xFF)),
    ("orange", (0xFF, 0xA5, 0x00)),
    ("purple", (0xA0, 0x20, 0xF0)),
    ("gray", (0xBE, 0xBE, 0xBE)),
    ("grey", (0xBE, 0xBE, 0xBE)),
    ("lime green", (0x32, 0xCD, 0x32)),
    ("limegreen", (0x32, 0xCD, 0x32)),
    ("dark gray", (0xA9, 0xA9, 0xA9)),
    ("hot pink", (0xFF, 0x69, 0xB4)),
];

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns this colour with its alpha scaled by `opacity` (clamped to `[0, 1]`).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        let a = (f64::from(self.a) * opacity).round() as u8;
        Self { a, ..self }
    }

    /// Alpha as a fraction in `[0, 1]`.
    pub fn opacity(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError(s.to_string()));
        }
        let lower = trimmed.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, (r, g, b))| Color::rgb(*r, *g, *b))
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xFF {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
