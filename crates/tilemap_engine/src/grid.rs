use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::{
    paint, Brush, Cell, Color, Direction, EngineError, OptionPatch, OptionRegistry, OptionSpec, Palette, Result, Size, TagValue, Tile, Tool,
};

pub const MIN_LAYER_COUNT: usize = 1;
pub const MAX_LAYER_COUNT: usize = 32;

/// The editable tile map: a dense cell grid plus layers, palette and the
/// option vocabulary.
///
/// Cells are stored row-major (`y * width + x`) and rebuilt wholesale on
/// resize, new-map and import. All mutation flows through this type; the
/// renderer observes changes through the dirty flag / version counter pair.
pub struct GridMap {
    size: Size,
    cells: Vec<Cell>,
    layer_count: usize,
    current_layer: usize,
    layer_visibility: BTreeMap<usize, bool>,
    palette: Palette,
    options: OptionRegistry,

    dirty: AtomicBool,
    version: AtomicU64,
}

impl std::fmt::Debug for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridMap")
            .field("size", &self.size)
            .field("layer_count", &self.layer_count)
            .field("current_layer", &self.current_layer)
            .field("palette", &self.palette.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for GridMap {
    fn eq(&self, other: &GridMap) -> bool {
        self.size == other.size
            && self.cells == other.cells
            && self.layer_count == other.layer_count
            && self.current_layer == other.current_layer
            && self.layer_visibility == other.layer_visibility
            && self.palette == other.palette
            && self.options == other.options
    }
}

impl Default for GridMap {
    fn default() -> Self {
        let mut map = Self::blank();
        map.populate(128, 128);
        map
    }
}

impl GridMap {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidDimension { width, height });
        }
        let mut map = Self::blank();
        map.populate(width, height);
        Ok(map)
    }

    fn blank() -> Self {
        GridMap {
            size: Size::default(),
            cells: Vec::new(),
            layer_count: 1,
            current_layer: 0,
            layer_visibility: BTreeMap::from([(0, true)]),
            palette: Palette::default(),
            options: OptionRegistry::default(),
            dirty: AtomicBool::new(true),
            version: AtomicU64::new(0),
        }
    }

    fn populate(&mut self, width: i32, height: i32) {
        self.size = Size::new(width, height);
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(x, y));
            }
        }
        self.cells = cells;
    }

    pub fn get_width(&self) -> i32 {
        self.size.width
    }

    pub fn get_height(&self) -> i32 {
        self.size.height
    }

    pub fn get_size(&self) -> Size {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Rebuild the cell collection at a new size.
    ///
    /// Painted content is intentionally not preserved; a resize repopulates
    /// blank cells. Palette, layers and the option vocabulary stay.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidDimension { width, height });
        }
        self.populate(width, height);
        self.mark_dirty();
        Ok(())
    }

    pub fn set_map_width(&mut self, width: i32) -> Result<()> {
        self.resize(width, self.size.height)
    }

    pub fn set_map_height(&mut self, height: i32) -> Result<()> {
        self.resize(self.size.width, height)
    }

    /// Start over: empty palette, a single visible layer, blank cells.
    pub fn new_map(&mut self, width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidDimension { width, height });
        }
        self.palette.clear();
        self.layer_count = 1;
        self.current_layer = 0;
        self.layer_visibility = BTreeMap::from([(0, true)]);
        self.populate(width, height);
        self.mark_dirty();
        Ok(())
    }

    /// Row-major index of `(x, y)`, with a coordinate-match check that
    /// defends against indices captured before a resize.
    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return None;
        }
        let index = (y * self.size.width + x) as usize;
        match self.cells.get(index) {
            Some(cell) if cell.is_at(x, y) => Some(index),
            _ => None,
        }
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index_of(x, y).map(|index| &self.cells[index])
    }

    pub(crate) fn get_cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        self.index_of(x, y).map(|index| &mut self.cells[index])
    }

    pub(crate) fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Merge an option patch into the cell at `(x, y)`; out of bounds is a
    /// silent no-op.
    pub fn set_cell_options(&mut self, x: i32, y: i32, patch: OptionPatch) {
        if let Some(cell) = self.get_cell_mut(x, y) {
            cell.set_options(patch);
            self.mark_dirty();
        }
    }

    // === Adjacency ===

    /// Index of the orthogonal neighbor in `direction`, `None` at grid edges.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let position = self.cells.get(index)?.get_position() + direction.offset();
        self.index_of(position.x, position.y)
    }

    /// Up to `max_count` consecutive cell indices strictly in one direction,
    /// stopping early at the grid edge. The start cell is not included.
    pub fn walk_direction(&self, start: usize, direction: Direction, max_count: i32) -> Vec<usize> {
        let mut result = Vec::new();
        let mut current = start;
        for _ in 0..max_count {
            match self.neighbor(current, direction) {
                Some(next) => {
                    result.push(next);
                    current = next;
                }
                None => break,
            }
        }
        result
    }

    /// The connected region around `start` in which every cell satisfies
    /// `predicate`, gathered by breadth-first traversal over adjacency.
    ///
    /// The start cell is always part of the region; every other member is
    /// reachable from it through predicate-satisfying cells only. Each cell
    /// is visited at most once, so the walk terminates on uniform maps.
    pub fn region_where<F>(&self, start: usize, predicate: F) -> Vec<usize>
    where
        F: Fn(&Cell) -> bool,
    {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut region = Vec::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(index) = queue.pop_front() {
            for direction in Direction::ALL {
                if let Some(next) = self.neighbor(index, direction) {
                    if !visited.contains(&next) && predicate(&self.cells[next]) {
                        visited.insert(next);
                        queue.push_back(next);
                    }
                }
            }
            region.push(index);
        }
        region
    }

    /// Every cell within `radius` orthogonal hops of the (floored) center.
    ///
    /// Built by walking a vertical line of `2 * radius + 1` cells and then
    /// walking left/right from each line cell, so the cost is bounded by the
    /// radius alone, never by the map size. An out-of-bounds center yields an
    /// empty result: nothing is visible there, it is not an error.
    pub fn query_window(&self, center_x: f32, center_y: f32, radius: i32) -> Vec<&Cell> {
        let x = center_x.floor() as i32;
        let y = center_y.floor() as i32;
        let Some(center) = self.index_of(x, y) else {
            return Vec::new();
        };

        let mut seen: HashSet<usize> = HashSet::new();
        let mut line = vec![center];
        seen.insert(center);

        for direction in [Direction::Top, Direction::Bottom] {
            for index in self.walk_direction(center, direction, radius) {
                if seen.insert(index) {
                    line.push(index);
                }
            }
        }

        let mut result = line.clone();
        for &index in &line {
            for direction in [Direction::Left, Direction::Right] {
                for next in self.walk_direction(index, direction, radius) {
                    if seen.insert(next) {
                        result.push(next);
                    }
                }
            }
        }

        result.into_iter().map(|index| &self.cells[index]).collect()
    }

    // === Layers ===

    pub fn get_layer_count(&self) -> usize {
        self.layer_count
    }

    /// Set the layer count, clamped to `[1, 32]`.
    ///
    /// Shrinking strips the removed layers' tile slots from every cell and
    /// clamps the current layer; growing marks the new layers visible.
    pub fn set_layer_count(&mut self, count: usize) {
        let count = count.clamp(MIN_LAYER_COUNT, MAX_LAYER_COUNT);
        if count == self.layer_count {
            return;
        }
        if count < self.layer_count {
            for layer in count..self.layer_count {
                self.layer_visibility.remove(&layer);
                for cell in &mut self.cells {
                    cell.remove_layer_slot(layer);
                }
            }
        } else {
            for layer in self.layer_count..count {
                self.layer_visibility.insert(layer, true);
            }
        }
        self.layer_count = count;
        if self.current_layer >= self.layer_count {
            self.current_layer = self.layer_count - 1;
        }
        self.mark_dirty();
    }

    pub fn add_layer(&mut self) {
        if self.layer_count >= MAX_LAYER_COUNT {
            return;
        }
        self.layer_count += 1;
        self.layer_visibility.insert(self.layer_count - 1, true);
        self.mark_dirty();
    }

    pub fn remove_layer(&mut self) {
        if self.layer_count <= MIN_LAYER_COUNT {
            return;
        }
        self.layer_count -= 1;
        self.layer_visibility.remove(&self.layer_count);
        for cell in &mut self.cells {
            cell.remove_layer_slot(self.layer_count);
        }
        if self.current_layer >= self.layer_count {
            self.current_layer = self.layer_count - 1;
        }
        self.mark_dirty();
    }

    pub fn get_current_layer(&self) -> usize {
        self.current_layer
    }

    pub fn set_current_layer(&mut self, layer: usize) {
        self.current_layer = layer.min(self.layer_count - 1);
    }

    pub fn increment_layer(&mut self) {
        self.set_current_layer(self.current_layer + 1);
    }

    pub fn decrement_layer(&mut self) {
        self.current_layer = self.current_layer.saturating_sub(1);
    }

    pub fn set_layer_visibility(&mut self, layer: usize, visible: bool) {
        self.layer_visibility.insert(layer, visible);
        self.mark_dirty();
    }

    /// Layers are visible unless explicitly marked hidden.
    pub fn is_layer_visible(&self, layer: usize) -> bool {
        self.layer_visibility.get(&layer).copied().unwrap_or(true)
    }

    pub(crate) fn visibility_entries(&self) -> &BTreeMap<usize, bool> {
        &self.layer_visibility
    }

    pub(crate) fn set_visibility_entries(&mut self, entries: BTreeMap<usize, bool>) {
        self.layer_visibility = entries;
    }

    // === Palette ===

    pub fn get_palette(&self) -> &Palette {
        &self.palette
    }

    pub fn push_tile_into_palette(&mut self, image: Option<String>, width: i32, height: i32, color: Color) {
        self.palette.push_image(image, width, height, color);
        self.mark_dirty();
    }

    pub fn get_tile_from_palette(&self, index: usize) -> Option<&Tile> {
        self.palette.get(index)
    }

    /// Merge property tags into a palette tile; unknown indices are ignored.
    pub fn set_tile_properties(&mut self, index: usize, patch: impl IntoIterator<Item = (String, TagValue)>) {
        if let Some(tile) = self.palette.get_mut(index) {
            tile.set_properties(patch);
            self.mark_dirty();
        }
    }

    pub(crate) fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    // === Option vocabulary ===

    pub fn get_options(&self) -> &OptionRegistry {
        &self.options
    }

    pub fn declare_option(&mut self, key: impl Into<String>, spec: OptionSpec) {
        self.options.declare(key, spec);
        self.mark_dirty();
    }

    /// Remove a key from the vocabulary and strip it from every cell.
    pub fn remove_option(&mut self, key: &str) {
        self.options.remove(key);
        for cell in &mut self.cells {
            cell.set_options(OptionPatch::from([(key.to_string(), None)]));
        }
        self.mark_dirty();
    }

    pub(crate) fn set_option_registry(&mut self, options: OptionRegistry) {
        self.options = options;
    }

    // === Tools ===

    /// Apply a tool at `(x, y)` with the given brush on the current layer.
    ///
    /// Out-of-bounds coordinates are a silent no-op and leave the dirty flag
    /// untouched; pointer drags routinely run past the map edge.
    pub fn execute_tool(&mut self, x: i32, y: i32, tool: &Tool, brush: Brush) {
        let Some(index) = self.index_of(x, y) else {
            return;
        };
        paint::apply_tool(self, index, tool, brush);
        self.mark_dirty();
    }

    // === Change tracking ===

    /// Mark the map as changed. This increments the version counter; bursts
    /// of mutations within one render tick collapse into a single observed
    /// dirty transition.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Acknowledge the current state (called after a redraw).
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    pub fn get_version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }
}
