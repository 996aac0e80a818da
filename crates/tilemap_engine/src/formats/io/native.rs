//! Native JSON map document.
//!
//! The only full-fidelity format: dimensions, every layer slot of every
//! cell, per-cell options, the palette with all metadata, layer count and
//! visibility all round-trip exactly. The current layer is deliberately not
//! persisted and resets to 0 on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EngineError, GridMap, OptionRegistry, OptionSpec, Palette, Result, TagValue, Tile};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapDocument {
    map_size: [i32; 2],
    map_cells: Vec<CellRecord>,
    palette: Vec<Tile>,
    layer_count: usize,
    #[serde(default)]
    options: BTreeMap<String, OptionSpec>,
    #[serde(default)]
    visible_layers: BTreeMap<String, bool>,
}

#[derive(Serialize, Deserialize)]
struct CellRecord {
    x: i32,
    y: i32,
    #[serde(default)]
    tiles: BTreeMap<String, usize>,
    #[serde(default)]
    options: BTreeMap<String, TagValue>,
}

pub(crate) fn save_native(map: &GridMap) -> Result<Vec<u8>> {
    Ok(to_string(map)?.into_bytes())
}

pub(crate) fn to_string(map: &GridMap) -> Result<String> {
    let document = MapDocument {
        map_size: [map.get_width(), map.get_height()],
        map_cells: map
            .cells()
            .map(|cell| CellRecord {
                x: cell.get_position().x,
                y: cell.get_position().y,
                tiles: cell.get_tiles().iter().map(|(layer, tile)| (layer.to_string(), *tile)).collect(),
                options: cell.get_options().clone(),
            })
            .collect(),
        palette: map.get_palette().tiles().to_vec(),
        layer_count: map.get_layer_count(),
        options: map.get_options().entries().clone(),
        visible_layers: map.visibility_entries().iter().map(|(layer, visible)| (layer.to_string(), *visible)).collect(),
    };
    Ok(serde_json::to_string(&document)?)
}

pub(crate) fn load_native(data: &[u8]) -> Result<GridMap> {
    from_str(std::str::from_utf8(data)?)
}

pub(crate) fn from_str(data: &str) -> Result<GridMap> {
    let document: MapDocument = serde_json::from_str(data).map_err(|err| EngineError::malformed(format!("invalid map document: {err}")))?;
    let [width, height] = document.map_size;

    let mut map = GridMap::new(width, height).map_err(|_| EngineError::malformed(format!("invalid map size {width}x{height}")))?;
    map.set_layer_count(document.layer_count);

    // an absent or empty visibility table means every layer is visible
    if document.visible_layers.is_empty() {
        map.set_visibility_entries((0..map.get_layer_count()).map(|layer| (layer, true)).collect());
    } else {
        let mut entries = BTreeMap::new();
        for (key, visible) in document.visible_layers {
            let layer: usize = key
                .parse()
                .map_err(|_| EngineError::malformed(format!("invalid layer key '{key}' in visibility table")))?;
            entries.insert(layer, visible);
        }
        map.set_visibility_entries(entries);
    }

    let palette_len = document.palette.len();
    map.set_palette(Palette::from_tiles(document.palette));

    for record in document.map_cells {
        let Some(cell) = map.get_cell_mut(record.x, record.y) else {
            return Err(EngineError::malformed(format!(
                "cell ({}, {}) outside the {width}x{height} map",
                record.x, record.y
            )));
        };
        cell.replace_options(record.options);
        for (key, tile) in record.tiles {
            let layer: usize = key
                .parse()
                .map_err(|_| EngineError::malformed(format!("invalid layer key '{key}' on cell ({}, {})", record.x, record.y)))?;
            if layer >= crate::MAX_LAYER_COUNT {
                return Err(EngineError::malformed(format!("layer {layer} exceeds the layer limit")));
            }
            if tile >= palette_len {
                log::warn!("cell ({}, {}) references tile {tile} outside the palette, treating as empty", record.x, record.y);
                continue;
            }
            cell.set_tile(layer, Some(tile));
        }
    }

    map.set_option_registry(OptionRegistry::from_entries(document.options));
    Ok(map)
}
