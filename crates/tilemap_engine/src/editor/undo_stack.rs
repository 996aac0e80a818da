use crate::Result;

/// Undo/redo surface of an editing session.
pub trait UndoState {
    fn undo_description(&self) -> Option<String>;
    fn can_undo(&self) -> bool;
    fn undo(&mut self) -> Result<()>;

    fn redo_description(&self) -> Option<String>;
    fn can_redo(&self) -> bool;
    fn redo(&mut self) -> Result<()>;
}

/// Maximum number of retained snapshots; the oldest entry is discarded
/// beyond this depth.
pub const HISTORY_LIMIT: usize = 50;

/// Bounded linear history of whole-map snapshots.
///
/// Snapshots are full serialized copies rather than diffs: interactive map
/// sizes keep the per-action cost acceptable, and snapshot frequency is
/// bounded by the user's input rate. The undo side always retains the entry
/// describing the current state, so it is never undone past.
#[derive(Debug, Default)]
pub struct HistoryStack {
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
}

impl HistoryStack {
    /// Push a serialized snapshot; any redoable future is invalidated.
    pub fn push_state(&mut self, state: String) {
        self.undo_stack.push(state);
        if self.undo_stack.len() > HISTORY_LIMIT {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Move the top snapshot to the redo side and hand back the state to
    /// restore, or `None` when only the current state remains.
    pub fn undo(&mut self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.undo_stack.last().cloned()
    }

    /// Move the most recently undone snapshot back and hand it over for
    /// restoring, or `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<String> {
        let state = self.redo_stack.pop()?;
        self.undo_stack.push(state);
        self.undo_stack.last().cloned()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryStack, HISTORY_LIMIT};

    #[test]
    fn test_single_entry_is_never_undone() {
        let mut history = HistoryStack::default();
        history.push_state("a".to_string());
        assert!(!history.can_undo());
        assert_eq!(None, history.undo());
        assert_eq!(1, history.undo_depth());
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut history = HistoryStack::default();
        history.push_state("a".to_string());
        history.push_state("b".to_string());

        assert_eq!(Some("a".to_string()), history.undo());
        assert_eq!(1, history.redo_depth());
        assert_eq!(Some("b".to_string()), history.redo());
        assert_eq!(0, history.redo_depth());
    }

    #[test]
    fn test_push_invalidates_redo() {
        let mut history = HistoryStack::default();
        history.push_state("a".to_string());
        history.push_state("b".to_string());
        history.undo();
        assert!(history.can_redo());

        history.push_state("c".to_string());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = HistoryStack::default();
        for i in 0..HISTORY_LIMIT + 7 {
            history.push_state(i.to_string());
        }
        assert_eq!(HISTORY_LIMIT, history.undo_depth());

        // the oldest entries were evicted
        let mut oldest = None;
        while let Some(state) = history.undo() {
            oldest = Some(state);
        }
        assert_eq!(Some("7".to_string()), oldest);
    }
}
