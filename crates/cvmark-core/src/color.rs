//! Pixel and paint colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One 8-bit RGBA pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    /// Value returned for reads outside a bitmap.
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Pack the color channels into `0x00RRGGBB` (alpha is ignored).
    #[inline]
    pub fn packed_rgb(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Paint color handed to painters.
///
/// `Transparent` means "do not paint": painters must skip the cell entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    #[default]
    Transparent,
    Solid(Rgba),
}

impl Color {
    pub const BLACK: Color = Color::Solid(Rgba::BLACK);
    pub const WHITE: Color = Color::Solid(Rgba::WHITE);

    #[inline]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Color::Transparent)
    }

    #[inline]
    pub fn rgba(&self) -> Option<Rgba> {
        match self {
            Color::Transparent => None,
            Color::Solid(c) => Some(*c),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color {input:?} (expected \"transparent\", a color name or #rgb/#rrggbb/#rrggbbaa)")]
pub struct ColorParseError {
    pub input: String,
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError {
            input: s.to_string(),
        };
        let t = s.trim().to_ascii_lowercase();
        match t.as_str() {
            "transparent" | "none" => return Ok(Color::Transparent),
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            _ => {}
        }

        let hex = t.strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| err())
        };
        let rgba = match hex.len() {
            3 => Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?),
            6 => Rgba::rgb(byte(0)?, byte(2)?, byte(4)?),
            8 => Rgba {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            },
            _ => return Err(err()),
        };
        Ok(Color::Solid(rgba))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Transparent => f.write_str("transparent"),
            Color::Solid(c) if c.a == 255 => write!(f, "#{:02x}{:02x}{:02x}", c.r, c.g, c.b),
            Color::Solid(c) => write!(f, "#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a),
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
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!("#000".parse::<Color>(), Ok(Color::BLACK));
        assert_eq!("#FFFFFF".parse::<Color>(), Ok(Color::WHITE));
        assert_eq!(
            "#10203040".parse::<Color>(),
            Ok(Color::Solid(Rgba {
                r: 0x10,
                g: 0x20,
                b: 0x30,
                a: 0x40
            }))
        );
        assert_eq!("transparent".parse::<Color>(), Ok(Color::Transparent));
    }

    #[test]
    fn rejects_garbage() {
        assert!("#12".parse::<Color>().is_err());
        assert!("red-ish".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Color::Solid(Rgba::rgb(1, 2, 3))).expect("json");
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, Color::Solid(Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn packs_rgb_without_alpha() {
        let c = Rgba {
            r: 0x12,
            g: 0x34,
            b: 0x56,
            a: 0x00,
        };
        assert_eq!(c.packed_rgb(), 0x0012_3456);
    }
}
