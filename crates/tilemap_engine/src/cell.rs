use std::collections::BTreeMap;

use crate::{Position, TagValue};

/// Tri-state option patch: `Some(value)` sets a key, `None` deletes it.
pub type OptionPatch = BTreeMap<String, Option<TagValue>>;

/// One grid coordinate's editable state across all layers.
///
/// Layer slots are sparse: a layer with no tile has no entry at all, it is
/// never stored as an explicit empty value. Coordinates are fixed for the
/// cell's lifetime; the whole collection is rebuilt on resize or import.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    position: Position,
    tiles: BTreeMap<usize, usize>,
    options: BTreeMap<String, TagValue>,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell {
            position: Position::new(x, y),
            tiles: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }

    pub fn get_position(&self) -> Position {
        self.position
    }

    pub fn is_at(&self, x: i32, y: i32) -> bool {
        self.position.x == x && self.position.y == y
    }

    /// Set or clear the tile slot of one layer.
    ///
    /// Layer bounds are not validated here; the grid keeps every caller
    /// below its layer count.
    pub fn set_tile(&mut self, layer: usize, tile: Option<usize>) {
        match tile {
            Some(index) => {
                self.tiles.insert(layer, index);
            }
            None => {
                self.tiles.remove(&layer);
            }
        }
    }

    pub fn get_tile(&self, layer: usize) -> Option<usize> {
        self.tiles.get(&layer).copied()
    }

    pub fn set_tiles(&mut self, tiles: impl IntoIterator<Item = (usize, Option<usize>)>) {
        for (layer, tile) in tiles {
            self.set_tile(layer, tile);
        }
    }

    pub fn get_tiles(&self) -> &BTreeMap<usize, usize> {
        &self.tiles
    }

    /// Merge an option patch; keys patched with `None` are deleted.
    pub fn set_options(&mut self, patch: OptionPatch) {
        for (key, value) in patch {
            match value {
                Some(value) => {
                    self.options.insert(key, value);
                }
                None => {
                    self.options.remove(&key);
                }
            }
        }
    }

    pub fn get_options(&self) -> &BTreeMap<String, TagValue> {
        &self.options
    }

    pub fn clear_options(&mut self) {
        self.options.clear();
    }

    pub(crate) fn replace_options(&mut self, options: BTreeMap<String, TagValue>) {
        self.options = options;
    }

    pub(crate) fn remove_layer_slot(&mut self, layer: usize) {
        self.tiles.remove(&layer);
    }
}
