use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_premul(self) -> [u8; 4] {
        let a = self.a as u16;
        [
            ((self.r as u16 * a + 127) / 255) as u8,
            ((self.g as u16 * a + 127) / 255) as u8,
            ((self.b as u16 * a + 127) / 255) as u8,
            self.a,
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "{}", self.to_hex())
        } else {
            write!(f, "{}{:02x}", self.to_hex(), self.a)
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(named) = named_color(s) {
            return Ok(named);
        }
        parse_hex(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn named_color(s: &str) -> Option<Color> {
    let c = match s.to_ascii_lowercase().as_str() {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "none" | "transparent" => Color::TRANSPARENT,
        _ => return None,
    };
    Some(c)
}

fn parse_hex(s: &str) -> Result<Color, String> {
    let had_hash = s.starts_with('#');
    let hex = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !hex.is_ascii() {
        return Err(format!("unknown color \"{s}\""));
    }

    match hex.len() {
        // Short form only with an explicit '#', so "red"-like typos don't parse as hex.
        3 if had_hash => {
            let mut out = [0u8; 3];
            for (i, ch) in hex.chars().enumerate() {
                let v = hex_byte(&ch.to_string())?;
                out[i] = v * 17;
            }
            Ok(Color::rgb(out[0], out[1], out[2]))
        }
        6 => Ok(Color::rgb(
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
        )),
        8 => Ok(Color::rgba(
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
            hex_byte(&hex[6..8])?,
        )),
        _ => Err(format!(
            "unknown color \"{s}\" (expected a name, #RGB, #RRGGBB or #RRGGBBAA)"
        )),
    }
}
