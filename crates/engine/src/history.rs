//! Undo/redo history of reversible cell edits.
//!
//! A `Command` captures the before/after state of exactly one logical
//! edit on one cell and is immutable once constructed. `CommandHistory`
//! keeps two LIFO stacks; applying a fresh command always clears the redo
//! stack, so redo history never survives a new edit.

use crate::cell_id::CellId;
use crate::grid::Grid;

/// One reversible edit. A closed set of edit kinds, each carrying enough
/// state to undo itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetText {
        cell: CellId,
        old: String,
        new: String,
    },
    SetBackgroundColor {
        cell: CellId,
        old: u32,
        new: u32,
    },
}

impl Command {
    /// Capture a text edit against the grid's current state.
    pub fn set_text(grid: &Grid, cell: CellId, new: impl Into<String>) -> Self {
        Command::SetText {
            cell,
            old: grid.text(cell).to_string(),
            new: new.into(),
        }
    }

    /// Capture a background color edit against the grid's current state.
    pub fn set_background_color(grid: &Grid, cell: CellId, new: u32) -> Self {
        Command::SetBackgroundColor {
            cell,
            old: grid.background_color(cell),
            new,
        }
    }

    /// Short human-readable label for undo/redo menus.
    pub fn description(&self) -> &'static str {
        match self {
            Command::SetText { .. } => "cell text change",
            Command::SetBackgroundColor { .. } => "cell background color change",
        }
    }

    fn execute(&self, grid: &mut Grid) {
        match self {
            Command::SetText { cell, new, .. } => grid.set_text(*cell, new),
            Command::SetBackgroundColor { cell, new, .. } => {
                grid.set_background_color(*cell, *new)
            }
        }
    }

    fn unexecute(&self, grid: &mut Grid) {
        match self {
            Command::SetText { cell, old, .. } => grid.set_text(*cell, old),
            Command::SetBackgroundColor { cell, old, .. } => {
                grid.set_background_color(*cell, *old)
            }
        }
    }
}

/// Undo/redo stacks of commands.
#[derive(Debug, Default)]
pub struct CommandHistory {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a brand-new command and record it.
    ///
    /// Clears the redo stack first: a fresh edit invalidates redo history.
    pub fn apply(&mut self, grid: &mut Grid, command: Command) {
        self.redo_stack.clear();
        command.execute(grid);
        self.undo_stack.push(command);
    }

    /// Undo the most recent command. No-op on an empty stack.
    /// Returns true if a command was undone.
    pub fn undo(&mut self, grid: &mut Grid) -> bool {
        match self.undo_stack.pop() {
            Some(command) => {
                command.unexecute(grid);
                self.redo_stack.push(command);
                true
            }
            None => false,
        }
    }

    /// Redo the most recently undone command. No-op on an empty stack.
    /// Returns true if a command was redone.
    pub fn redo(&mut self, grid: &mut Grid) -> bool {
        match self.redo_stack.pop() {
            Some(command) => {
                command.execute(grid);
                self.undo_stack.push(command);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Peek the description of the command `undo` would revert.
    pub fn undo_description(&self) -> Option<&'static str> {
        self.undo_stack.last().map(Command::description)
    }

    /// Peek the description of the command `redo` would re-apply.
    pub fn redo_description(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Command::description)
    }

    /// Drop all history. A persistence loader calls this after restoring
    /// a grid, since load is not an undoable user action.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a1() -> CellId {
        CellId::new(0, 0)
    }

    #[test]
    fn test_apply_and_undo_text() {
        let mut grid = Grid::new(5, 5);
        let mut history = CommandHistory::new();

        let cmd = Command::set_text(&grid, a1(), "5");
        history.apply(&mut grid, cmd);
        assert_eq!(grid.value(a1()), "5");
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert!(history.undo(&mut grid));
        assert_eq!(grid.text(a1()), "");
        assert_eq!(grid.value(a1()), "");
        assert!(history.can_redo());
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut grid = Grid::new(5, 5);
        let mut history = CommandHistory::new();
        assert!(!history.undo(&mut grid));
        assert!(!history.redo(&mut grid));
    }

    #[test]
    fn test_descriptions() {
        let mut grid = Grid::new(5, 5);
        let mut history = CommandHistory::new();
        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), None);

        let cmd = Command::set_text(&grid, a1(), "1");
        history.apply(&mut grid, cmd);
        let cmd = Command::set_background_color(&grid, a1(), 0xFFAA_0000);
        history.apply(&mut grid, cmd);

        assert_eq!(
            history.undo_description(),
            Some("cell background color change")
        );
        history.undo(&mut grid);
        assert_eq!(history.undo_description(), Some("cell text change"));
        assert_eq!(
            history.redo_description(),
            Some("cell background color change")
        );
    }

    #[test]
    fn test_color_undo_restores_previous() {
        let mut grid = Grid::new(5, 5);
        let mut history = CommandHistory::new();

        let cmd = Command::set_background_color(&grid, a1(), 0xFF00_FF00);
        history.apply(&mut grid, cmd);
        let cmd = Command::set_background_color(&grid, a1(), 0xFF0000_FF);
        history.apply(&mut grid, cmd);
        assert_eq!(grid.background_color(a1()), 0xFF0000_FF);

        history.undo(&mut grid);
        assert_eq!(grid.background_color(a1()), 0xFF00_FF00);
        history.undo(&mut grid);
        assert_eq!(grid.background_color(a1()), crate::cell::DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut grid = Grid::new(5, 5);
        let mut history = CommandHistory::new();

        let cmd = Command::set_text(&grid, a1(), "1");
        history.apply(&mut grid, cmd);
        let cmd = Command::set_text(&grid, a1(), "2");
        history.apply(&mut grid, cmd);
        history.undo(&mut grid);
        assert!(history.can_redo());

        let cmd = Command::set_text(&grid, a1(), "3");
        history.apply(&mut grid, cmd);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut grid));
        assert_eq!(grid.value(a1()), "3");
    }

    #[test]
    fn test_clear_drops_both_stacks() {
        let mut grid = Grid::new(5, 5);
        let mut history = CommandHistory::new();

        let cmd = Command::set_text(&grid, a1(), "1");
        history.apply(&mut grid, cmd);
        let cmd = Command::set_text(&grid, a1(), "2");
        history.apply(&mut grid, cmd);
        history.undo(&mut grid);

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
