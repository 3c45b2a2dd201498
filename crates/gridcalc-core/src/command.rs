//! Reversible cell commands and undo/redo history
//!
//! A [`CellCommand`] records one cell's value before and after a text or color change.
//! Commands from one user action form a [`CommandBatch`]; [`History`] keeps the batches on
//! an undo stack and a redo stack.

use crate::cell::{CellAddress, Color};
use crate::error::{Error, Result};
use crate::grid::Grid;

/// One reversible change to one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellCommand {
    /// Replace the cell's text
    Text {
        address: CellAddress,
        old: String,
        new: String,
    },
    /// Replace the cell's color
    Color {
        address: CellAddress,
        old: Color,
        new: Color,
    },
}

impl CellCommand {
    /// Capture a text change against the cell's current text
    ///
    /// Fails if the grid has no cell at `address`.
    pub fn text<S: Into<String>>(grid: &Grid, address: CellAddress, new: S) -> Result<Self> {
        let old = grid.try_get(address)?.text().to_string();
        Ok(CellCommand::Text {
            address,
            old,
            new: new.into(),
        })
    }

    /// Capture a color change against the cell's current color
    ///
    /// Fails if the grid has no cell at `address`.
    pub fn color(grid: &Grid, address: CellAddress, new: Color) -> Result<Self> {
        let old = grid.try_get(address)?.color();
        Ok(CellCommand::Color { address, old, new })
    }

    /// The cell this command changes
    pub fn address(&self) -> CellAddress {
        match self {
            CellCommand::Text { address, .. } | CellCommand::Color { address, .. } => *address,
        }
    }

    /// Apply the new value
    pub fn execute(&self, grid: &mut Grid) -> Result<()> {
        self.write(grid, Side::New)
    }

    /// Restore the captured old value
    pub fn undo(&self, grid: &mut Grid) -> Result<()> {
        self.write(grid, Side::Old)
    }

    /// Re-apply the new value after an undo
    pub fn redo(&self, grid: &mut Grid) -> Result<()> {
        self.execute(grid)
    }

    fn write(&self, grid: &mut Grid, side: Side) -> Result<()> {
        match self {
            CellCommand::Text { address, old, new } => {
                let text = side.pick(old, new).clone();
                grid.set_text_at(address.row, address.col, text)
            }
            CellCommand::Color { address, old, new } => {
                grid.set_color_at(address.row, address.col, *side.pick(old, new))
            }
        }
    }

    /// Check if the cell currently holds the given side of this command
    fn holds(&self, grid: &Grid, side: Side) -> bool {
        match self {
            CellCommand::Text { address, old, new } => grid
                .get(*address)
                .map_or(false, |cell| cell.text() == side.pick(old, new)),
            CellCommand::Color { address, old, new } => grid
                .get(*address)
                .map_or(false, |cell| cell.color() == *side.pick(old, new)),
        }
    }

    /// Label for the action that undoes this command
    pub fn undo_message(&self) -> &'static str {
        match self {
            CellCommand::Text { .. } => "Undo Text Change",
            CellCommand::Color { .. } => "Undo Color Change",
        }
    }

    /// Label for the action that redoes this command
    pub fn redo_message(&self) -> &'static str {
        match self {
            CellCommand::Text { .. } => "Redo Text Change",
            CellCommand::Color { .. } => "Redo Color Change",
        }
    }
}

/// Which captured value of a command to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Old,
    New,
}

impl Side {
    fn pick<'a, T>(self, old: &'a T, new: &'a T) -> &'a T {
        match self {
            Side::Old => old,
            Side::New => new,
        }
    }

    fn opposite(self) -> Side {
        match self {
            Side::Old => Side::New,
            Side::New => Side::Old,
        }
    }
}

/// The commands produced by one user action, undone and redone as a unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBatch {
    commands: Vec<CellCommand>,
    label: Option<String>,
}

impl CommandBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty batch with a description
    pub fn with_label<S: Into<String>>(label: S) -> Self {
        Self {
            commands: Vec::new(),
            label: Some(label.into()),
        }
    }

    /// Append a command
    pub fn push(&mut self, command: CellCommand) {
        self.commands.push(command);
    }

    /// Commands in the order they were added
    pub fn commands(&self) -> &[CellCommand] {
        &self.commands
    }

    /// Optional description of the action
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the batch holds no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Execute every command in order
    ///
    /// All or nothing: if a command fails, every write already made by this batch is
    /// reverted, the failing command's included, and the error is returned.
    pub fn execute(&self, grid: &mut Grid) -> Result<()> {
        self.write(grid, Side::New)
    }

    /// Undo every command in order, all or nothing
    pub fn undo(&self, grid: &mut Grid) -> Result<()> {
        self.write(grid, Side::Old)
    }

    /// Redo every command in order, all or nothing
    pub fn redo(&self, grid: &mut Grid) -> Result<()> {
        self.execute(grid)
    }

    fn write(&self, grid: &mut Grid, side: Side) -> Result<()> {
        for (i, command) in self.commands.iter().enumerate() {
            if let Err(err) = command.write(grid, side) {
                // A write can be stored before a dependent fails to recalculate
                let written = if command.holds(grid, side) { i + 1 } else { i };
                for applied in self.commands[..written].iter().rev() {
                    if let Err(rollback) = applied.write(grid, side.opposite()) {
                        log::warn!("rolling back {} failed: {}", applied.address(), rollback);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undo label of the first command
    pub fn undo_message(&self) -> Option<&'static str> {
        self.commands.first().map(CellCommand::undo_message)
    }

    /// Redo label of the first command
    pub fn redo_message(&self) -> Option<&'static str> {
        self.commands.first().map(CellCommand::redo_message)
    }
}

impl From<CellCommand> for CommandBatch {
    fn from(command: CellCommand) -> Self {
        Self {
            commands: vec![command],
            label: None,
        }
    }
}

impl FromIterator<CellCommand> for CommandBatch {
    fn from_iter<I: IntoIterator<Item = CellCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
            label: None,
        }
    }
}

/// Undo and redo stacks of command batches
///
/// Pushing onto the undo stack leaves the redo stack alone; the redo stack only fills when
/// a batch is undone.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<CommandBatch>,
    redo: Vec<CommandBatch>,
}

impl History {
    /// Create empty stacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a batch onto the undo stack
    pub fn push_undo(&mut self, batch: CommandBatch) {
        self.undo.push(batch);
    }

    /// Push a batch onto the redo stack
    pub fn push_redo(&mut self, batch: CommandBatch) {
        self.redo.push(batch);
    }

    /// Most recent undoable batch
    pub fn peek_undo(&self) -> Result<&CommandBatch> {
        self.undo.last().ok_or(Error::EmptyHistory("undo"))
    }

    /// Most recent redoable batch
    pub fn peek_redo(&self) -> Result<&CommandBatch> {
        self.redo.last().ok_or(Error::EmptyHistory("redo"))
    }

    /// Take the most recent undoable batch
    pub fn pop_undo(&mut self) -> Result<CommandBatch> {
        self.undo.pop().ok_or(Error::EmptyHistory("undo"))
    }

    /// Take the most recent redoable batch
    pub fn pop_redo(&mut self) -> Result<CommandBatch> {
        self.redo.pop().ok_or(Error::EmptyHistory("redo"))
    }

    /// Depth of the undo stack
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Depth of the redo stack
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Check if there is anything to undo
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if there is anything to redo
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Grid {
    /// Execute a batch and record it for undo
    ///
    /// If a command fails, the grid is left as it was before the call, the batch is not
    /// recorded and the error is returned.
    pub fn execute(&mut self, batch: CommandBatch) -> Result<()> {
        batch.execute(self)?;
        log::debug!(
            "executed {} command(s){}",
            batch.len(),
            batch.label().map(|l| format!(" for '{}'", l)).unwrap_or_default()
        );
        self.history_mut().push_undo(batch);
        Ok(())
    }

    /// Undo the most recent batch and move it to the redo stack
    ///
    /// On failure the batch's cells are restored and it goes back onto the undo stack.
    pub fn undo(&mut self) -> Result<()> {
        let batch = self.history_mut().pop_undo()?;
        log::debug!("{}", batch.undo_message().unwrap_or("Undo"));
        match batch.undo(self) {
            Ok(()) => {
                self.history_mut().push_redo(batch);
                Ok(())
            }
            Err(err) => {
                self.history_mut().push_undo(batch);
                Err(err)
            }
        }
    }

    /// Redo the most recently undone batch and move it to the undo stack
    ///
    /// On failure the batch's cells are restored and it goes back onto the redo stack.
    pub fn redo(&mut self) -> Result<()> {
        let batch = self.history_mut().pop_redo()?;
        log::debug!("{}", batch.redo_message().unwrap_or("Redo"));
        match batch.redo(self) {
            Ok(()) => {
                self.history_mut().push_undo(batch);
                Ok(())
            }
            Err(err) => {
                self.history_mut().push_redo(batch);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn a1() -> CellAddress {
        CellAddress::new(0, 0)
    }

    fn text(grid: &Grid, addr: CellAddress) -> &str {
        grid.get(addr).unwrap().text()
    }

    #[test]
    fn test_text_command_round_trip() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.set_text_at(0, 0, "3").unwrap();

        let command = CellCommand::text(&grid, a1(), "5").unwrap();
        command.execute(&mut grid).unwrap();
        assert_eq!(text(&grid, a1()), "5");
        command.undo(&mut grid).unwrap();
        assert_eq!(text(&grid, a1()), "3");
        command.redo(&mut grid).unwrap();
        assert_eq!(text(&grid, a1()), "5");
    }

    #[test]
    fn test_color_command() {
        let mut grid = Grid::new(2, 2).unwrap();
        let red = Color::rgb(255, 0, 0);
        let command = CellCommand::color(&grid, a1(), red).unwrap();

        command.execute(&mut grid).unwrap();
        assert_eq!(grid.get(a1()).unwrap().color(), red);
        command.undo(&mut grid).unwrap();
        assert_eq!(grid.get(a1()).unwrap().color(), Color::NONE);
    }

    #[test]
    fn test_command_against_absent_cell() {
        let grid = Grid::new(2, 2).unwrap();
        assert_eq!(
            CellCommand::text(&grid, CellAddress::new(5, 0), "x"),
            Err(Error::RowOutOfBounds(5, 1))
        );
        assert_eq!(
            CellCommand::color(&grid, CellAddress::new(0, 9), Color::NONE),
            Err(Error::ColumnOutOfBounds(9, 1))
        );
    }

    #[test]
    fn test_messages() {
        let grid = Grid::new(1, 1).unwrap();
        let text = CellCommand::text(&grid, a1(), "x").unwrap();
        let color = CellCommand::color(&grid, a1(), Color::rgb(0, 0, 0)).unwrap();
        assert_eq!(text.undo_message(), "Undo Text Change");
        assert_eq!(text.redo_message(), "Redo Text Change");
        assert_eq!(color.undo_message(), "Undo Color Change");
        assert_eq!(color.redo_message(), "Redo Color Change");

        let batch: CommandBatch = vec![color, text].into_iter().collect();
        assert_eq!(batch.undo_message(), Some("Undo Color Change"));
        assert_eq!(CommandBatch::new().redo_message(), None);
    }

    #[test]
    fn test_history_stacks() {
        let mut history = History::new();
        assert_eq!(history.peek_undo(), Err(Error::EmptyHistory("undo")));
        assert_eq!(history.pop_redo(), Err(Error::EmptyHistory("redo")));

        history.push_undo(CommandBatch::with_label("first"));
        history.push_undo(CommandBatch::with_label("second"));
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.peek_undo().unwrap().label(), Some("second"));

        let batch = history.pop_undo().unwrap();
        history.push_redo(batch);
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 1);
        assert!(history.can_redo());

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_grid_undo_redo() {
        let mut grid = Grid::new(2, 2).unwrap();
        let b1 = CellAddress::new(0, 1);

        let mut batch = CommandBatch::with_label("fill");
        batch.push(CellCommand::text(&grid, a1(), "1").unwrap());
        batch.push(CellCommand::text(&grid, b1, "2").unwrap());
        grid.execute(batch).unwrap();
        assert_eq!((text(&grid, a1()), text(&grid, b1)), ("1", "2"));

        grid.undo().unwrap();
        assert_eq!((text(&grid, a1()), text(&grid, b1)), ("", ""));
        assert_eq!(grid.history().redo_len(), 1);

        grid.redo().unwrap();
        assert_eq!((text(&grid, a1()), text(&grid, b1)), ("1", "2"));
        assert_eq!(grid.history().undo_len(), 1);
        assert_eq!(grid.history().redo_len(), 0);

        assert_eq!(grid.redo(), Err(Error::EmptyHistory("redo")));
    }

    #[test]
    fn test_execute_does_not_clear_redo() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.execute(CellCommand::text(&grid, a1(), "1").unwrap().into())
            .unwrap();
        grid.undo().unwrap();
        grid.execute(CellCommand::text(&grid, a1(), "2").unwrap().into())
            .unwrap();
        assert_eq!(grid.history().redo_len(), 1);
    }

    #[test]
    fn test_failed_execute_rolls_back() {
        let mut grid = Grid::new(2, 2).unwrap();
        let mut batch = CommandBatch::new();
        batch.push(CellCommand::text(&grid, a1(), "1").unwrap());
        batch.push(CellCommand::text(&grid, CellAddress::new(1, 0), "=B2").unwrap());

        assert_eq!(
            grid.execute(batch),
            Err(Error::UninitializedCell("B2".into()))
        );
        assert_eq!(text(&grid, a1()), "");
        assert_eq!(grid.history().undo_len(), 0);
    }

    #[test]
    fn test_failed_recalculation_rolls_back_whole_batch() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_text("A1", "2").unwrap();
        grid.set_text("B1", "=4/A1").unwrap();

        let c1 = CellAddress::new(0, 2);
        let batch: CommandBatch = vec![
            CellCommand::text(&grid, c1, "x").unwrap(),
            CellCommand::text(&grid, a1(), "0").unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            grid.execute(batch),
            Err(Error::recalculation(
                "B1",
                Error::Formula(gridcalc_formula::FormulaError::DivisionByZero)
            ))
        );
        assert_eq!(text(&grid, a1()), "2");
        assert_eq!(text(&grid, c1), "");
        assert_eq!(grid.cell("B1").unwrap().unwrap().value(), "2");
        assert_eq!(grid.history().undo_len(), 0);
    }

    #[test]
    fn test_failed_undo_restores_earlier_commands() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_text("A1", "2").unwrap();
        grid.set_text("B1", "=4/A1").unwrap();
        grid.set_text("C1", "x").unwrap();

        let c1 = CellAddress::new(0, 2);
        grid.history_mut().push_undo(
            vec![
                CellCommand::Text {
                    address: c1,
                    old: "".into(),
                    new: "x".into(),
                },
                CellCommand::Text {
                    address: a1(),
                    old: "0".into(),
                    new: "2".into(),
                },
            ]
            .into_iter()
            .collect(),
        );

        assert!(matches!(grid.undo(), Err(Error::Recalculation { .. })));
        assert_eq!(text(&grid, c1), "x");
        assert_eq!(text(&grid, a1()), "2");
        assert_eq!(grid.history().undo_len(), 1);
        assert_eq!(grid.history().redo_len(), 0);
    }

    #[test]
    fn test_failed_redo_restores_earlier_commands() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_text("A1", "2").unwrap();
        grid.set_text("B1", "=4/A1").unwrap();

        let c1 = CellAddress::new(0, 2);
        grid.history_mut().push_redo(
            vec![
                CellCommand::Color {
                    address: c1,
                    old: Color::NONE,
                    new: Color::rgb(0, 128, 0),
                },
                CellCommand::Text {
                    address: a1(),
                    old: "2".into(),
                    new: "0".into(),
                },
            ]
            .into_iter()
            .collect(),
        );

        assert!(matches!(grid.redo(), Err(Error::Recalculation { .. })));
        assert_eq!(grid.get(c1).unwrap().color(), Color::NONE);
        assert_eq!(text(&grid, a1()), "2");
        assert_eq!(grid.history().redo_len(), 1);
        assert_eq!(grid.history().undo_len(), 0);
    }

    #[test]
    fn test_failed_undo_returns_batch() {
        let mut grid = Grid::new(2, 2).unwrap();
        grid.set_text_at(0, 1, "4").unwrap();
        grid.set_text_at(0, 0, "=B1").unwrap();

        grid.history_mut().push_undo(CommandBatch::from(CellCommand::Text {
            address: a1(),
            old: "=A2".into(),
            new: "=B1".into(),
        }));
        assert_eq!(grid.undo(), Err(Error::UninitializedCell("A2".into())));
        assert_eq!(grid.history().undo_len(), 1);
        assert_eq!(grid.history().redo_len(), 0);
        assert_eq!(text(&grid, a1()), "=B1");
    }
}
