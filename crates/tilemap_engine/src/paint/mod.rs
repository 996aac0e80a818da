use std::collections::BTreeMap;

use crate::{GridMap, OptionPatch};

/// The currently selected palette tile, or `None` to erase.
pub type Brush = Option<usize>;

/// A mutation applied to one cell (and, for `Fill`, its connected region)
/// on the map's current layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Noop,
    Paint,
    Fill,
    ClearOptions,
    SetOption(String),
    RemoveOption(String),
}

impl Tool {
    pub fn get_description(&self) -> &str {
        match self {
            Tool::Noop => "no-op",
            Tool::Paint => "paint",
            Tool::Fill => "fill",
            Tool::ClearOptions => "clear options",
            Tool::SetOption(_) => "set option",
            Tool::RemoveOption(_) => "remove option",
        }
    }
}

/// Apply `tool` at an already bounds-checked cell index.
///
/// Tools never fail for any reachable cell state; the grid's `execute_tool`
/// is the only boundary that rejects coordinates.
pub(crate) fn apply_tool(map: &mut GridMap, index: usize, tool: &Tool, brush: Brush) {
    match tool {
        Tool::Noop => {}
        Tool::Paint => stamp_brush(map, index, brush),
        Tool::Fill => fill_region(map, index, brush),
        Tool::ClearOptions => map.cell_mut(index).clear_options(),
        Tool::SetOption(key) => {
            let value = map.get_options().get(key).value;
            map.cell_mut(index).set_options(OptionPatch::from([(key.clone(), Some(value))]));
        }
        Tool::RemoveOption(key) => {
            map.cell_mut(index).set_options(OptionPatch::from([(key.clone(), None)]));
        }
    }
}

/// Set the brush on the cell's current layer and stamp the brush tile's
/// property tags onto the cell, replacing whatever tags were there. An empty
/// brush (or one without tags) leaves the cell's options cleared.
fn stamp_brush(map: &mut GridMap, index: usize, brush: Brush) {
    let layer = map.get_current_layer();
    let properties = brush
        .and_then(|tile| map.get_tile_from_palette(tile))
        .map(|tile| tile.get_properties().clone())
        .unwrap_or_else(BTreeMap::new);

    let cell = map.cell_mut(index);
    cell.set_tile(layer, brush);
    cell.replace_options(properties);
}

/// Flood fill: paint every cell of the connected region that shares the
/// clicked cell's tile on the current layer (including "both empty").
fn fill_region(map: &mut GridMap, index: usize, brush: Brush) {
    let layer = map.get_current_layer();
    let target = map.cell(index).get_tile(layer);
    let region = map.region_where(index, |cell| cell.get_tile(layer) == target);
    for cell_index in region {
        stamp_brush(map, cell_index, brush);
    }
}
