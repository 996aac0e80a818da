//! Single-layer CSV raster.
//!
//! One comma-separated row of palette indices per map row, `-1` for empty.
//! Only layer 0 is representable; cell options, palette metadata and layers
//! beyond 0 are lost on export and fabricated from placeholders on import.
//! This is documented lossy behavior, not a defect.

use crate::{Color, EngineError, GridMap, Palette, Result, Tile, DEFAULT_TILE_DIMENSION};

pub(crate) fn save_raster(map: &GridMap) -> Vec<u8> {
    let mut lines = Vec::with_capacity(map.get_height() as usize);
    for y in 0..map.get_height() {
        let mut row = Vec::with_capacity(map.get_width() as usize);
        for x in 0..map.get_width() {
            let tile = map.get_cell(x, y).and_then(|cell| cell.get_tile(0));
            row.push(tile.map_or(-1, |index| index as i64).to_string());
        }
        lines.push(row.join(","));
    }
    lines.join("\n").into_bytes()
}

pub(crate) fn load_raster(data: &[u8]) -> Result<GridMap> {
    let text = std::str::from_utf8(data)?;
    let rows: Vec<&str> = text.trim().lines().map(|line| line.trim_end_matches('\r')).filter(|line| !line.is_empty()).collect();
    if rows.is_empty() {
        return Err(EngineError::malformed("empty raster data"));
    }

    let height = rows.len();
    let width = rows[0].split(',').count();

    let mut grid: Vec<Vec<i64>> = Vec::with_capacity(height);
    for (y, row) in rows.iter().enumerate() {
        let values: Vec<i64> = row
            .split(',')
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| EngineError::malformed(format!("invalid tile index '{}' in row {y}", value.trim())))
            })
            .collect::<Result<_>>()?;
        if values.len() != width {
            return Err(EngineError::malformed(format!(
                "row {y} has {} columns, expected {width}",
                values.len()
            )));
        }
        grid.push(values);
    }

    let mut map = GridMap::new(width as i32, height as i32)?;

    let max_index = grid.iter().flatten().copied().filter(|&value| value >= 0).max();
    if let Some(max_index) = max_index {
        let tiles = (0..=max_index as usize).map(placeholder_tile).collect();
        map.set_palette(Palette::from_tiles(tiles));
    }

    for (y, values) in grid.iter().enumerate() {
        for (x, &value) in values.iter().enumerate() {
            if value >= 0 {
                if let Some(cell) = map.get_cell_mut(x as i32, y as i32) {
                    cell.set_tile(0, Some(value as usize));
                }
            }
        }
    }

    Ok(map)
}

/// Fabricate a stand-in tile for an imported index: no image, default
/// dimensions and a color derived from the index so distinct indices stay
/// distinguishable on screen.
pub(crate) fn placeholder_tile(index: usize) -> Tile {
    Tile::new(
        index,
        DEFAULT_TILE_DIMENSION,
        DEFAULT_TILE_DIMENSION,
        None,
        placeholder_color(index),
    )
}

pub(crate) fn placeholder_color(index: usize) -> Color {
    let rgb = (index as u64 * 999_999) % 0xFF_FFFF;
    Color::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{placeholder_color, placeholder_tile};
    use crate::{formats::FileFormat, Color, GridMap, Tool, DEFAULT_TILE_COLOR, DEFAULT_TILE_DIMENSION};

    #[test]
    fn test_export_shape() {
        let mut map = GridMap::new(3, 2).unwrap();
        map.push_tile_into_palette(None, 64, 64, DEFAULT_TILE_COLOR);
        map.push_tile_into_palette(None, 64, 64, DEFAULT_TILE_COLOR);
        map.execute_tool(0, 0, &Tool::Paint, Some(1));
        map.execute_tool(2, 1, &Tool::Paint, Some(0));

        let bytes = FileFormat::Raster.to_bytes(&map).unwrap();
        assert_eq!("1,-1,-1\n-1,-1,0", String::from_utf8(bytes).unwrap());
    }

    #[test]
    fn test_round_trip_preserves_layer_zero() {
        let mut map = GridMap::new(4, 3).unwrap();
        for _ in 0..3 {
            map.push_tile_into_palette(None, 64, 64, DEFAULT_TILE_COLOR);
        }
        map.execute_tool(1, 0, &Tool::Paint, Some(2));
        map.execute_tool(3, 2, &Tool::Paint, Some(0));

        let bytes = FileFormat::Raster.to_bytes(&map).unwrap();
        let imported = FileFormat::Raster.from_bytes(&bytes).unwrap();

        assert_eq!(map.get_size(), imported.get_size());
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(
                    map.get_cell(x, y).unwrap().get_tile(0),
                    imported.get_cell(x, y).unwrap().get_tile(0),
                    "tile mismatch at ({x}, {y})"
                );
            }
        }
        assert_eq!(1, imported.get_layer_count());
    }

    #[test]
    fn test_import_fabricates_placeholder_palette() {
        let imported = FileFormat::Raster.from_bytes(b"2,-1\n-1,0").unwrap();
        assert_eq!(3, imported.get_palette().len());
        assert_eq!(placeholder_color(2), imported.get_tile_from_palette(2).unwrap().get_color());
        assert_eq!(DEFAULT_TILE_DIMENSION, imported.get_tile_from_palette(0).unwrap().get_width());
        assert_eq!(None, imported.get_tile_from_palette(1).unwrap().get_image());
    }

    #[test]
    fn test_placeholder_color_formula() {
        assert_eq!(Color::new(0, 0, 0), placeholder_color(0));
        // 999999 = 0x0f423f
        assert_eq!(Color::new(0x0f, 0x42, 0x3f), placeholder_color(1));
        assert_eq!(placeholder_color(7), placeholder_tile(7).get_color());
    }

    #[test]
    fn test_mismatched_row_length_is_malformed() {
        assert!(FileFormat::Raster.from_bytes(b"1,2,3\n1,2").is_err());
    }

    #[test]
    fn test_non_integer_value_is_malformed() {
        assert!(FileFormat::Raster.from_bytes(b"1,x\n2,3").is_err());
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(FileFormat::Raster.from_bytes(b"").is_err());
        assert!(FileFormat::Raster.from_bytes(b"  \n  ").is_err());
    }
}
