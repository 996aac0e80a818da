//! TMX-style XML interchange format.
//!
//! One `<map>` element with a single `<tileset>` listing every palette tile
//! and one `<layer>` per map layer holding a CSV grid of 1-based gids
//! (0 = empty; the on-disk gid is the palette index plus one). Cell options
//! and option vocabulary are not representable here.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{EngineError, GridMap, Palette, Result, Tile, MAX_LAYER_COUNT, DEFAULT_TILE_DIMENSION};

use super::raster::placeholder_tile;

pub(crate) fn save_tmx(map: &GridMap) -> Vec<u8> {
    let width = map.get_width();
    let height = map.get_height();
    let palette = map.get_palette();
    let tile_width = palette.get(0).map_or(DEFAULT_TILE_DIMENSION, Tile::get_width);
    let tile_height = palette.get(0).map_or(DEFAULT_TILE_DIMENSION, Tile::get_height);

    let mut parts: Vec<String> = Vec::new();
    parts.push("<?xml version=\"1.0\" encoding=\"UTF-8\"?>".to_string());
    parts.push(format!(
        "<map version=\"1.0\" tiledversion=\"1.10\" orientation=\"orthogonal\" renderorder=\"right-down\" width=\"{width}\" height=\"{height}\" tilewidth=\"{tile_width}\" tileheight=\"{tile_height}\">"
    ));
    parts.push(format!(
        " <tileset firstgid=\"1\" name=\"tileset\" tilewidth=\"{tile_width}\" tileheight=\"{tile_height}\" tilecount=\"{}\" columns=\"0\">",
        palette.len()
    ));
    for tile in palette.iter() {
        parts.push(format!("  <tile id=\"{}\">", tile.get_index()));
        parts.push(format!(
            "   <image width=\"{}\" height=\"{}\" source=\"{}\"/>",
            tile.get_width(),
            tile.get_height(),
            tile.get_image().unwrap_or_default()
        ));
        parts.push("  </tile>".to_string());
    }
    parts.push(" </tileset>".to_string());

    for layer in 0..map.get_layer_count() {
        parts.push(format!(
            " <layer id=\"{}\" name=\"Layer {layer}\" width=\"{width}\" height=\"{height}\">",
            layer + 1
        ));
        parts.push("  <data encoding=\"csv\">".to_string());
        for y in 0..height {
            let mut row = Vec::with_capacity(width as usize);
            for x in 0..width {
                let tile = map.get_cell(x, y).and_then(|cell| cell.get_tile(layer));
                row.push(tile.map_or(0, |index| index + 1).to_string());
            }
            parts.push(row.join(","));
        }
        parts.push("  </data>".to_string());
        parts.push(" </layer>".to_string());
    }
    parts.push("</map>".to_string());
    parts.join("\n").into_bytes()
}

#[derive(Default)]
struct TilesetEntry {
    width: Option<i32>,
    height: Option<i32>,
    source: Option<String>,
}

pub(crate) fn load_tmx(data: &[u8]) -> Result<GridMap> {
    let xml = std::str::from_utf8(data)?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut map_size: Option<(i32, i32)> = None;
    let mut tile_size = (DEFAULT_TILE_DIMENSION, DEFAULT_TILE_DIMENSION);
    let mut tileset_tiles: BTreeMap<usize, TilesetEntry> = BTreeMap::new();
    let mut current_tile_id: Option<usize> = None;
    let mut layers: Vec<Vec<String>> = Vec::new();
    let mut in_data = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.name().as_ref() {
                b"map" => {
                    let width = require_int_attr(e, "width")?;
                    let height = require_int_attr(e, "height")?;
                    map_size = Some((width, height));
                    tile_size = (
                        int_attr(e, "tilewidth").unwrap_or(DEFAULT_TILE_DIMENSION),
                        int_attr(e, "tileheight").unwrap_or(DEFAULT_TILE_DIMENSION),
                    );
                }
                b"tile" => {
                    current_tile_id = Some(require_int_attr(e, "id")? as usize);
                }
                b"image" => {
                    if let Some(id) = current_tile_id {
                        tileset_tiles.insert(
                            id,
                            TilesetEntry {
                                width: int_attr(e, "width"),
                                height: int_attr(e, "height"),
                                source: string_attr(e, "source"),
                            },
                        );
                    }
                }
                b"layer" => {
                    layers.push(Vec::new());
                }
                b"data" => {
                    in_data = true;
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_data {
                    let text = e
                        .unescape()
                        .map_err(|err| EngineError::malformed(format!("invalid layer data: {err}")))?;
                    if let Some(rows) = layers.last_mut() {
                        rows.extend(
                            text.lines()
                                .map(|line| line.trim().trim_end_matches(',').to_string())
                                .filter(|line| !line.is_empty()),
                        );
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"tile" => current_tile_id = None,
                b"data" => in_data = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    let Some((width, height)) = map_size else {
        return Err(EngineError::malformed("no map element found"));
    };
    if layers.len() > MAX_LAYER_COUNT {
        return Err(EngineError::malformed(format!(
            "{} layers exceed the limit of {MAX_LAYER_COUNT}",
            layers.len()
        )));
    }

    let mut map = GridMap::new(width, height).map_err(|_| EngineError::malformed(format!("invalid map size {width}x{height}")))?;
    map.set_layer_count(layers.len().max(1));
    map.set_palette(build_palette(&tileset_tiles, tile_size));
    let palette_len = map.get_palette().len();

    for (layer, rows) in layers.iter().enumerate() {
        if rows.len() != height as usize {
            return Err(EngineError::malformed(format!(
                "layer {layer} has {} rows, expected {height}",
                rows.len()
            )));
        }
        for (y, row) in rows.iter().enumerate() {
            let gids: Vec<u64> = row
                .split(',')
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| EngineError::malformed(format!("invalid gid '{}' in layer {layer}", value.trim())))
                })
                .collect::<Result<_>>()?;
            if gids.len() != width as usize {
                return Err(EngineError::malformed(format!(
                    "layer {layer} row {y} has {} columns, expected {width}",
                    gids.len()
                )));
            }
            for (x, &gid) in gids.iter().enumerate() {
                if gid == 0 {
                    continue;
                }
                let tile = (gid - 1) as usize;
                if tile >= palette_len {
                    log::warn!("gid {gid} not covered by the tileset, treating as empty");
                    continue;
                }
                if let Some(cell) = map.get_cell_mut(x as i32, y as i32) {
                    cell.set_tile(layer, Some(tile));
                }
            }
        }
    }

    Ok(map)
}

/// Build a dense palette from the declared tileset ids, padding gaps with
/// placeholder tiles so every index keeps its position. Tiles whose image
/// carries no dimensions inherit the map's tile size.
fn build_palette(tileset_tiles: &BTreeMap<usize, TilesetEntry>, tile_size: (i32, i32)) -> Palette {
    let Some(max_id) = tileset_tiles.keys().next_back().copied() else {
        return Palette::default();
    };
    let tiles = (0..=max_id)
        .map(|id| match tileset_tiles.get(&id) {
            Some(entry) => Tile::new(
                id,
                entry.width.unwrap_or(tile_size.0),
                entry.height.unwrap_or(tile_size.1),
                entry.source.clone().filter(|source| !source.is_empty()),
                crate::DEFAULT_TILE_COLOR,
            ),
            None => {
                log::warn!("tileset skips tile id {id}, inserting a placeholder");
                placeholder_tile(id)
            }
        })
        .collect();
    Palette::from_tiles(tiles)
}

fn string_attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return std::str::from_utf8(&attr.value).ok().map(str::to_string);
        }
    }
    None
}

fn int_attr(e: &BytesStart<'_>, name: &str) -> Option<i32> {
    string_attr(e, name).and_then(|value| value.parse().ok())
}

fn require_int_attr(e: &BytesStart<'_>, name: &str) -> Result<i32> {
    let element = String::from_utf8_lossy(e.name().as_ref()).to_string();
    int_attr(e, name).ok_or_else(|| EngineError::malformed(format!("missing or invalid '{name}' attribute on <{element}>")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{formats::FileFormat, Color, GridMap, Tool};

    fn sample_map() -> GridMap {
        let mut map = GridMap::new(4, 3).unwrap();
        map.push_tile_into_palette(Some("grass.png".to_string()), 32, 32, Color::new(0, 0xAA, 0));
        map.push_tile_into_palette(Some("rock.png".to_string()), 32, 32, Color::new(0x55, 0x55, 0x55));
        map.add_layer();

        map.execute_tool(0, 0, &Tool::Paint, Some(0));
        map.execute_tool(3, 2, &Tool::Paint, Some(1));
        map.set_current_layer(1);
        map.execute_tool(1, 1, &Tool::Paint, Some(1));
        map.set_current_layer(0);
        map
    }

    #[test]
    fn test_export_structure() {
        let xml = String::from_utf8(FileFormat::Interchange.to_bytes(&sample_map()).unwrap()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<map version=\"1.0\" tiledversion=\"1.10\" orientation=\"orthogonal\" renderorder=\"right-down\" width=\"4\" height=\"3\" tilewidth=\"32\" tileheight=\"32\">"));
        assert!(xml.contains("<tileset firstgid=\"1\" name=\"tileset\" tilewidth=\"32\" tileheight=\"32\" tilecount=\"2\" columns=\"0\">"));
        assert!(xml.contains("<image width=\"32\" height=\"32\" source=\"grass.png\"/>"));
        assert!(xml.contains("<layer id=\"1\" name=\"Layer 0\" width=\"4\" height=\"3\">"));
        assert!(xml.contains("<layer id=\"2\" name=\"Layer 1\" width=\"4\" height=\"3\">"));
        // layer 0, first row: tile 0 becomes gid 1
        assert!(xml.contains("1,0,0,0"));
        // layer 0, last row: tile 1 becomes gid 2
        assert!(xml.contains("0,0,0,2"));
    }

    #[test]
    fn test_round_trip_layers_and_tiles() {
        let map = sample_map();
        let bytes = FileFormat::Interchange.to_bytes(&map).unwrap();
        let imported = FileFormat::Interchange.from_bytes(&bytes).unwrap();

        assert_eq!(map.get_size(), imported.get_size());
        assert_eq!(2, imported.get_layer_count());
        for y in 0..3 {
            for x in 0..4 {
                for layer in 0..2 {
                    assert_eq!(
                        map.get_cell(x, y).unwrap().get_tile(layer),
                        imported.get_cell(x, y).unwrap().get_tile(layer),
                        "tile mismatch at ({x}, {y}) layer {layer}"
                    );
                }
            }
        }
        let tile = imported.get_tile_from_palette(0).unwrap();
        assert_eq!(Some("grass.png"), tile.get_image());
        assert_eq!(32, tile.get_width());
    }

    #[test]
    fn test_missing_map_element_is_malformed() {
        assert!(FileFormat::Interchange.from_bytes(b"<?xml version=\"1.0\"?><tileset/>").is_err());
    }

    #[test]
    fn test_short_row_is_malformed() {
        let xml = "<map width=\"3\" height=\"2\" tilewidth=\"64\" tileheight=\"64\">\
                   <layer id=\"1\" name=\"Layer 0\" width=\"3\" height=\"2\"><data encoding=\"csv\">\n0,0,0\n0,0\n</data></layer></map>";
        assert!(FileFormat::Interchange.from_bytes(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_row_is_malformed() {
        let xml = "<map width=\"3\" height=\"2\" tilewidth=\"64\" tileheight=\"64\">\
                   <layer id=\"1\" name=\"Layer 0\" width=\"3\" height=\"2\"><data encoding=\"csv\">\n0,0,0\n</data></layer></map>";
        assert!(FileFormat::Interchange.from_bytes(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_unknown_gid_decodes_as_empty() {
        let xml = "<map width=\"2\" height=\"1\" tilewidth=\"64\" tileheight=\"64\">\
                   <tileset firstgid=\"1\" name=\"tileset\" tilewidth=\"64\" tileheight=\"64\" tilecount=\"1\" columns=\"0\">\
                   <tile id=\"0\"><image width=\"64\" height=\"64\" source=\"a.png\"/></tile></tileset>\
                   <layer id=\"1\" name=\"Layer 0\" width=\"2\" height=\"1\"><data encoding=\"csv\">\n1,9\n</data></layer></map>";
        let imported = FileFormat::Interchange.from_bytes(xml.as_bytes()).unwrap();
        assert_eq!(Some(0), imported.get_cell(0, 0).unwrap().get_tile(0));
        assert_eq!(None, imported.get_cell(1, 0).unwrap().get_tile(0));
    }

    #[test]
    fn test_map_without_layers_gets_one_empty_layer() {
        let xml = "<map width=\"2\" height=\"2\" tilewidth=\"64\" tileheight=\"64\"></map>";
        let imported = FileFormat::Interchange.from_bytes(xml.as_bytes()).unwrap();
        assert_eq!(1, imported.get_layer_count());
        assert!(imported.cells().all(|cell| cell.get_tiles().is_empty()));
    }
}
