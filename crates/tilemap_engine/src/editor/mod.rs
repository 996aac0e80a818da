//! The editing session context.
//!
//! `EditState` ties together the map, the snapshot history and the active
//! tool/brush selection. It is constructed explicitly at session start and
//! passed down to whoever needs it; there is no global instance.

mod undo_stack;
pub use undo_stack::*;

use crate::{formats::io::native, Brush, FileFormat, GridMap, Result, Tool};

pub struct EditState {
    map: GridMap,
    history: HistoryStack,
    current_tool: Tool,
    current_brush: Brush,
}

impl Default for EditState {
    fn default() -> Self {
        EditState {
            map: GridMap::default(),
            history: HistoryStack::default(),
            current_tool: Tool::default(),
            current_brush: None,
        }
    }
}

impl EditState {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Ok(EditState {
            map: GridMap::new(width, height)?,
            history: HistoryStack::default(),
            current_tool: Tool::default(),
            current_brush: None,
        })
    }

    pub fn get_map(&self) -> &GridMap {
        &self.map
    }

    pub fn get_map_mut(&mut self) -> &mut GridMap {
        &mut self.map
    }

    pub fn get_current_tool(&self) -> &Tool {
        &self.current_tool
    }

    pub fn set_current_tool(&mut self, tool: Tool) {
        self.current_tool = tool;
    }

    /// Disarm the tool; subsequent pointer input mutates nothing.
    pub fn clear_tool(&mut self) {
        self.current_tool = Tool::Noop;
    }

    pub fn get_current_brush(&self) -> Brush {
        self.current_brush
    }

    pub fn set_current_brush(&mut self, brush: Brush) {
        self.current_brush = brush;
    }

    /// Apply the active tool at grid coordinates; out of bounds is a silent
    /// no-op, as pointer drags routinely leave the map.
    pub fn execute_tool(&mut self, x: i32, y: i32) {
        let tool = self.current_tool.clone();
        self.map.execute_tool(x, y, &tool, self.current_brush);
    }

    /// Capture the current map state as an undoable snapshot.
    pub fn snapshot(&mut self) -> Result<()> {
        let state = native::to_string(&self.map)?;
        self.history.push_state(state);
        Ok(())
    }

    pub fn get_history(&self) -> &HistoryStack {
        &self.history
    }

    /// Replace the map with a decoded import; existing state is discarded
    /// only when the whole input validated.
    pub fn load_bytes(&mut self, format: FileFormat, data: &[u8]) -> Result<()> {
        let map = format.from_bytes(data)?;
        self.map = map;
        self.map.mark_dirty();
        Ok(())
    }

    pub fn to_bytes(&self, format: FileFormat) -> Result<Vec<u8>> {
        format.to_bytes(&self.map)
    }

    fn restore(&mut self, state: &str) -> Result<()> {
        self.map = native::from_str(state)?;
        self.map.mark_dirty();
        Ok(())
    }
}

impl UndoState for EditState {
    fn undo_description(&self) -> Option<String> {
        self.can_undo().then(|| "map snapshot".to_string())
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn undo(&mut self) -> Result<()> {
        match self.history.undo() {
            Some(state) => self.restore(&state),
            None => Ok(()),
        }
    }

    fn redo_description(&self) -> Option<String> {
        self.can_redo().then(|| "map snapshot".to_string())
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn redo(&mut self) -> Result<()> {
        match self.history.redo() {
            Some(state) => self.restore(&state),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{EditState, UndoState};
    use crate::{Tool, DEFAULT_TILE_COLOR};

    fn session() -> EditState {
        let mut state = EditState::new(8, 8).unwrap();
        state.get_map_mut().push_tile_into_palette(None, 64, 64, DEFAULT_TILE_COLOR);
        state.set_current_tool(Tool::Paint);
        state.set_current_brush(Some(0));
        state
    }

    #[test]
    fn test_undo_after_single_snapshot_is_noop() {
        let mut state = session();
        state.execute_tool(1, 1);
        state.snapshot().unwrap();

        assert!(!state.can_undo());
        state.undo().unwrap();
        assert_eq!(Some(0), state.get_map().get_cell(1, 1).unwrap().get_tile(0));
    }

    #[test]
    fn test_undo_restores_first_snapshot() {
        let mut state = session();
        state.snapshot().unwrap();

        state.execute_tool(1, 1);
        state.snapshot().unwrap();

        assert!(state.can_undo());
        state.undo().unwrap();
        assert_eq!(None, state.get_map().get_cell(1, 1).unwrap().get_tile(0));
    }

    #[test]
    fn test_redo_reapplies_undone_snapshot() {
        let mut state = session();
        state.snapshot().unwrap();
        state.execute_tool(2, 3);
        state.snapshot().unwrap();

        state.undo().unwrap();
        assert!(state.can_redo());
        state.redo().unwrap();
        assert_eq!(Some(0), state.get_map().get_cell(2, 3).unwrap().get_tile(0));
        assert!(!state.can_redo());
    }

    #[test]
    fn test_failed_import_keeps_current_map() {
        let mut state = session();
        state.execute_tool(4, 4);

        let result = state.load_bytes(crate::FileFormat::Raster, b"1,2\n3");
        assert!(result.is_err());
        assert_eq!(Some(0), state.get_map().get_cell(4, 4).unwrap().get_tile(0));
    }

    #[test]
    fn test_clear_tool_disarms() {
        let mut state = session();
        state.clear_tool();
        state.execute_tool(1, 1);
        assert!(state.get_map().get_cell(1, 1).unwrap().get_tiles().is_empty());
    }
}
