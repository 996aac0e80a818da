use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Color;

/// Edge length in pixels assumed for tiles whose source image is unknown.
pub const DEFAULT_TILE_DIMENSION: i32 = 64;

/// Placeholder color shown while a tile image is absent or still loading.
pub const DEFAULT_TILE_COLOR: Color = Color::new(0xFF, 0x00, 0xFF);

/// Value of a free-form tag on a cell, a tile or the option vocabulary.
///
/// Untagged on the wire: booleans, `#rrggbb` color strings and plain strings
/// are told apart by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Color(Color),
    Text(String),
}

/// One entry of the palette.
///
/// Immutable once created except for `properties`; cells reference tiles by
/// index and never own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    index: usize,
    width: i32,
    height: i32,
    image: Option<String>,
    color: Color,
    #[serde(default)]
    properties: BTreeMap<String, TagValue>,
}

impl Tile {
    pub fn new(index: usize, width: i32, height: i32, image: Option<String>, color: Color) -> Self {
        Tile {
            index,
            width,
            height,
            image,
            color,
            properties: BTreeMap::new(),
        }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_width(&self) -> i32 {
        self.width
    }

    pub fn get_height(&self) -> i32 {
        self.height
    }

    pub fn get_image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn get_color(&self) -> Color {
        self.color
    }

    pub fn get_properties(&self) -> &BTreeMap<String, TagValue> {
        &self.properties
    }

    /// Merge a set of property tags into this tile.
    pub fn set_properties(&mut self, patch: impl IntoIterator<Item = (String, TagValue)>) {
        self.properties.extend(patch);
    }

    pub fn with_properties(mut self, properties: impl IntoIterator<Item = (String, TagValue)>) -> Self {
        self.properties.extend(properties);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_properties_merges() {
        let mut tile = Tile::new(0, 64, 64, None, DEFAULT_TILE_COLOR);
        tile.set_properties([("walkable".to_string(), TagValue::Bool(true))]);
        tile.set_properties([("terrain".to_string(), TagValue::Text("swamp".to_string()))]);

        assert_eq!(Some(&TagValue::Bool(true)), tile.get_properties().get("walkable"));
        assert_eq!(2, tile.get_properties().len());
    }

    #[test]
    fn test_tag_value_shapes() {
        let json = serde_json::to_string(&TagValue::Color(Color::new(1, 2, 3))).unwrap();
        assert_eq!("\"#010203\"", json);
        assert_eq!(TagValue::Bool(false), serde_json::from_str("false").unwrap());
        assert_eq!(TagValue::Text("hill".to_string()), serde_json::from_str("\"hill\"").unwrap());
        assert_eq!(TagValue::Color(Color::new(1, 2, 3)), serde_json::from_str("\"#010203\"").unwrap());
    }
}
