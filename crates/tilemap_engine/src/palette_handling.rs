use std::fmt::Display;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{EngineError, Result, Tile};

lazy_static::lazy_static! {
    static ref HEX_REGEX: Regex = Regex::new(r"([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})").unwrap();
}

/// Display color of a tile or option tag, serialized as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{Color: r={:02X}, g={:02X}, b={:02X}}}", self.r, self.g, self.b)
    }
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn get_rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        if let Some(cap) = HEX_REGEX.captures(hex) {
            let (_, [r, g, b]) = cap.extract();
            let r = u32::from_str_radix(r, 16)?;
            let g = u32::from_str_radix(g, 16)?;
            let b = u32::from_str_radix(b, 16)?;
            Ok(Color::new(r as u8, g as u8, b as u8))
        } else {
            Err(EngineError::InvalidHexColor { value: hex.to_string() })
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from(value: (u8, u8, u8)) -> Self {
        Color {
            r: value.0,
            g: value.1,
            b: value.2,
        }
    }
}

impl From<Color> for (u8, u8, u8) {
    fn from(value: Color) -> (u8, u8, u8) {
        (value.r, value.g, value.b)
    }
}

/// The ordered catalog of tiles available to paint with.
///
/// Insertion-ordered and append-only during editing: a tile's index is its
/// position at append time and never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    tiles: Vec<Tile>,
}

impl Palette {
    pub(crate) fn from_tiles(tiles: Vec<Tile>) -> Self {
        Palette { tiles }
    }

    /// Append a new tile; its index is the palette length at call time.
    pub fn push_image(&mut self, image: Option<String>, width: i32, height: i32, color: Color) -> usize {
        let index = self.tiles.len();
        self.tiles.push(Tile::new(index, width, height, image, color));
        index
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn clear(&mut self) {
        self.tiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::{Color, Palette, Tile, DEFAULT_TILE_COLOR, DEFAULT_TILE_DIMENSION};

    #[test]
    fn test_hex_round_trip() {
        let color = Color::new(0x12, 0xab, 0xef);
        assert_eq!(color, Color::from_hex(&color.to_hex()).unwrap());
        assert_eq!(Color::new(255, 0, 255), Color::from_hex("#FF00FF").unwrap());
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Color::from_hex("#f0").is_err());
        assert!(Color::from_hex("not a color").is_err());
    }

    #[test]
    fn test_push_assigns_dense_indices() {
        let mut palette = Palette::default();
        for i in 0..4 {
            let index = palette.push_image(None, DEFAULT_TILE_DIMENSION, DEFAULT_TILE_DIMENSION, DEFAULT_TILE_COLOR);
            assert_eq!(i, index);
        }
        assert_eq!(4, palette.len());
        assert_eq!(2, palette.get(2).map(Tile::get_index).unwrap());
        assert!(palette.get(4).is_none());
    }
}
