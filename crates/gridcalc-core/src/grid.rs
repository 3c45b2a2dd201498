//! The cell grid
//!
//! A [`Grid`] owns a fixed rectangle of [`Cell`]s. Writing text to a cell evaluates it
//! (formulas start with `=`), records which cells the formula reads and recalculates every
//! cell that reads the written one.

use crate::cell::{Cell, CellAddress, Color};
use crate::command::History;
use crate::config::GridConfig;
use crate::dependency::DependencyGraph;
use crate::error::{Error, Result};
use crate::notify::{self, CellChange, CellField, Notifier, SubscriptionId};
use crate::{MAX_CELLS, MAX_COLS, MAX_ROWS};
use gridcalc_formula::ExpressionTree;
use std::collections::BTreeMap;

/// A grid of cells with dependency-aware recalculation
///
/// # Example
///
/// ```rust
/// use gridcalc_core::Grid;
///
/// let mut grid = Grid::new(10, 5).unwrap();
/// grid.set_text("B1", "=A1*2").unwrap_err(); // A1 is still empty
/// grid.set_text("A1", "21").unwrap();
/// grid.set_text("B1", "=A1*2").unwrap();
/// assert_eq!(grid.cell("B1").unwrap().unwrap().value(), "42");
///
/// grid.set_text("A1", "5").unwrap();
/// assert_eq!(grid.cell("B1").unwrap().unwrap().value(), "10");
/// ```
#[derive(Debug)]
pub struct Grid {
    config: GridConfig,
    /// Row-major cell storage
    cells: Vec<Cell>,
    dependencies: DependencyGraph,
    history: History,
    pub(crate) notifier: Notifier,
}

/// A referenced cell's value as seen by a formula
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Number(f64),
    Text(String),
}

impl Grid {
    /// Create a grid with the given dimensions and default options
    pub fn new(rows: u32, cols: u16) -> Result<Self> {
        Self::with_config(GridConfig::new(rows, cols))
    }

    /// Create a grid from a full configuration
    pub fn with_config(config: GridConfig) -> Result<Self> {
        if config.rows > MAX_ROWS {
            return Err(Error::RowOutOfBounds(config.rows, MAX_ROWS));
        }
        if config.cols > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(config.cols, MAX_COLS));
        }

        let count = config.rows as usize * config.cols as usize;
        let too_large = || Error::GridTooLarge {
            rows: config.rows,
            cols: config.cols,
            limit: MAX_CELLS,
        };
        if count > MAX_CELLS {
            return Err(too_large());
        }

        let mut cells = Vec::new();
        cells.try_reserve_exact(count).map_err(|_| too_large())?;
        for row in 0..config.rows {
            for col in 0..config.cols {
                cells.push(Cell::new(CellAddress::new(row, col)));
            }
        }

        Ok(Self {
            config,
            cells,
            dependencies: DependencyGraph::new(),
            history: History::new(),
            notifier: Notifier::default(),
        })
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.config.rows
    }

    /// Number of columns
    pub fn cols(&self) -> u16 {
        self.config.cols
    }

    /// The grid's configuration
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Check if an address lies inside the grid
    pub fn contains(&self, addr: CellAddress) -> bool {
        addr.row < self.config.rows && addr.col < self.config.cols
    }

    /// Get a cell by row/column; `None` outside the grid
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.get(CellAddress::new(row, col))
    }

    /// Get a cell by address; `None` outside the grid
    pub fn get(&self, addr: CellAddress) -> Option<&Cell> {
        self.index(addr).map(|i| &self.cells[i])
    }

    /// Get a cell by address, failing outside the grid
    pub fn try_get(&self, addr: CellAddress) -> Result<&Cell> {
        let idx = self.checked_index(addr)?;
        Ok(&self.cells[idx])
    }

    /// Get a cell by A1-style name
    ///
    /// Fails only if the name does not parse; a name outside the grid gives `Ok(None)`.
    pub fn cell(&self, name: &str) -> Result<Option<&Cell>> {
        Ok(self.get(CellAddress::parse(name)?))
    }

    /// Iterate over every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// The dependency graph between formula cells
    pub fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    /// Check if a cell's formula is part of, or reads from, a reference cycle
    pub fn is_circular(&self, addr: CellAddress) -> bool {
        self.dependencies.has_circular_reference(addr)
    }

    /// Undo/redo stacks
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Mutable access to the undo/redo stacks
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Write a cell's text by A1-style name
    pub fn set_text<S: Into<String>>(&mut self, name: &str, text: S) -> Result<()> {
        let addr = CellAddress::parse(name)?;
        self.set_text_at(addr.row, addr.col, text)
    }

    /// Write a cell's text by row/column
    ///
    /// The new value is computed before anything is stored: if parsing, reference
    /// resolution or evaluation fails, the cell keeps its text, value and references. Once
    /// stored, every cell reading this one is recalculated. A dependent that fails to
    /// recalculate keeps its old value and the first such failure is returned, with this
    /// write still in place.
    pub fn set_text_at<S: Into<String>>(&mut self, row: u32, col: u16, text: S) -> Result<()> {
        let result = self.write_text(CellAddress::new(row, col), text.into());
        notify::dispatch(self);
        result
    }

    /// Write a cell's color by A1-style name
    pub fn set_color(&mut self, name: &str, color: Color) -> Result<()> {
        let addr = CellAddress::parse(name)?;
        self.set_color_at(addr.row, addr.col, color)
    }

    /// Write a cell's color by row/column
    pub fn set_color_at(&mut self, row: u32, col: u16, color: Color) -> Result<()> {
        let addr = CellAddress::new(row, col);
        let idx = self.checked_index(addr)?;
        if self.cells[idx].color == color {
            return Ok(());
        }

        self.cells[idx].color = color;
        log::debug!("{} color -> {}", addr, color);
        self.notifier.queue(CellChange {
            address: addr,
            field: CellField::Color,
        });
        notify::dispatch(self);
        Ok(())
    }

    /// Register a listener for cell changes
    ///
    /// # Example
    ///
    /// ```rust
    /// use gridcalc_core::{CellField, Grid};
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let mut grid = Grid::new(2, 2).unwrap();
    /// let texts = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&texts);
    /// grid.subscribe(move |_, change| {
    ///     if change.field == CellField::Text {
    ///         counter.set(counter.get() + 1);
    ///     }
    /// });
    ///
    /// grid.set_text("A1", "x").unwrap();
    /// grid.set_text("A1", "x").unwrap();
    /// assert_eq!(texts.get(), 1);
    /// ```
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&mut Grid, &CellChange) + 'static,
    {
        self.notifier.subscribe(Box::new(listener))
    }

    /// Remove a listener; returns `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.notifier.len()
    }

    fn index(&self, addr: CellAddress) -> Option<usize> {
        if self.contains(addr) {
            Some(addr.row as usize * self.config.cols as usize + addr.col as usize)
        } else {
            None
        }
    }

    fn checked_index(&self, addr: CellAddress) -> Result<usize> {
        if addr.row >= self.config.rows {
            return Err(Error::RowOutOfBounds(
                addr.row,
                self.config.rows.saturating_sub(1),
            ));
        }
        if addr.col >= self.config.cols {
            return Err(Error::ColumnOutOfBounds(
                addr.col,
                self.config.cols.saturating_sub(1),
            ));
        }
        Ok(addr.row as usize * self.config.cols as usize + addr.col as usize)
    }

    fn write_text(&mut self, addr: CellAddress, text: String) -> Result<()> {
        let idx = self.checked_index(addr)?;
        if self.cells[idx].text == text {
            return Ok(());
        }

        let (value, references) = self.evaluate_text(&text)?;

        let cell = &mut self.cells[idx];
        let value_changed = cell.value != value;
        cell.text = text;
        cell.value = value;
        log::debug!("{} text -> {:?} (value {:?})", addr, cell.text, cell.value);

        self.dependencies.set_precedents(addr, &references);
        if !references.is_empty() {
            log::debug!("{} reads {:?}", addr, self.dependencies.precedents(addr));
        }

        self.notifier.queue(CellChange {
            address: addr,
            field: CellField::Text,
        });

        if value_changed {
            self.cascade(addr)
        } else {
            Ok(())
        }
    }

    /// Compute the display value of `text` and the cells it reads
    fn evaluate_text(&self, text: &str) -> Result<(String, Vec<CellAddress>)> {
        let expression = match text.strip_prefix('=') {
            Some(expression) => expression,
            None => return Ok((text.to_string(), Vec::new())),
        };

        let mut tree = ExpressionTree::from_expression(expression)?;
        let names = tree.variable_names();
        if names.is_empty() {
            return Ok((format_number(tree.evaluate()?), Vec::new()));
        }

        let mut references = Vec::with_capacity(names.len());
        let mut resolved = Vec::with_capacity(names.len());
        for name in &names {
            let addr = self.reference(name)?;
            references.push(addr);
            resolved.push(self.resolve(addr, name)?);
        }

        let numbers: Option<Vec<(&str, f64)>> = names
            .iter()
            .zip(&resolved)
            .map(|(name, value)| match value {
                Resolved::Number(n) => Some((name.as_str(), *n)),
                Resolved::Text(_) => None,
            })
            .collect();

        let value = match numbers {
            Some(numbers) => {
                tree.gather_variable_values(&numbers);
                format_number(tree.evaluate()?)
            }
            None => resolved
                .iter()
                .map(|value| match value {
                    Resolved::Number(n) => format_number(*n),
                    Resolved::Text(text) => text.clone(),
                })
                .collect::<Vec<_>>()
                .join(" "),
        };

        Ok((value, references))
    }

    /// Map a formula variable to a cell of this grid
    fn reference(&self, name: &str) -> Result<CellAddress> {
        CellAddress::parse(name)
            .ok()
            .filter(|addr| self.contains(*addr))
            .ok_or_else(|| Error::InvalidReference(name.to_string()))
    }

    fn resolve(&self, addr: CellAddress, name: &str) -> Result<Resolved> {
        let cell = self.try_get(addr)?;
        if let Some(number) = cell.numeric_value() {
            Ok(Resolved::Number(number))
        } else if !cell.text.is_empty() {
            Ok(Resolved::Text(cell.value.clone()))
        } else {
            Err(Error::UninitializedCell(name.to_string()))
        }
    }

    /// Recalculate everything downstream of `origin`
    ///
    /// Cells are visited once each in [`DependencyGraph::recalc_order`]; a cell is only
    /// re-evaluated when one of the cells it reads changed value during this pass.
    fn cascade(&mut self, origin: CellAddress) -> Result<()> {
        let limit = self.config.cascade_limit();
        let recalc = self.dependencies.recalc_order(origin);

        // Changed cells and how many recalculations separate them from `origin`
        let mut changed: BTreeMap<CellAddress, usize> = BTreeMap::new();
        changed.insert(origin, 0);

        let mut first_error: Option<Error> = None;
        for &addr in &recalc.order {
            let depth = match self.changed_depth(addr, &changed) {
                Some(depth) => depth + 1,
                None => continue,
            };
            if depth > limit {
                let err = Error::CascadeDepthExceeded {
                    cell: addr.to_a1_string(),
                    limit,
                };
                log::warn!("recalculation from {} cut off: {}", origin, err);
                return Err(first_error.unwrap_or(err));
            }

            match self.recalculate(addr) {
                Ok(true) => {
                    changed.insert(addr, depth);
                }
                Ok(false) => {}
                Err(err) => {
                    log::warn!("{} kept its value: {}", addr, err);
                    if first_error.is_none() {
                        first_error = Some(Error::recalculation(addr.to_a1_string(), err));
                    }
                }
            }
        }

        let stalled = recalc
            .blocked
            .iter()
            .any(|&addr| self.changed_depth(addr, &changed).is_some());
        if stalled && first_error.is_none() {
            let cell = recalc
                .blocked
                .iter()
                .copied()
                .find(|&addr| self.dependencies.has_circular_reference(addr))
                .or_else(|| recalc.blocked.first().copied())
                .unwrap_or(origin);
            let err = Error::CircularReference(cell.to_a1_string());
            log::warn!("recalculation from {} stopped: {}", origin, err);
            first_error = Some(err);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Deepest changed cell among those `addr` reads
    fn changed_depth(
        &self,
        addr: CellAddress,
        changed: &BTreeMap<CellAddress, usize>,
    ) -> Option<usize> {
        self.dependencies
            .precedents(addr)
            .iter()
            .filter_map(|precedent| changed.get(precedent).copied())
            .max()
    }

    /// Re-evaluate one cell's unchanged text; returns whether its value changed
    fn recalculate(&mut self, addr: CellAddress) -> Result<bool> {
        let idx = self.checked_index(addr)?;
        let (value, _) = self.evaluate_text(&self.cells[idx].text)?;
        if self.cells[idx].value == value {
            return Ok(false);
        }

        log::debug!("{} recalculated -> {:?}", addr, value);
        self.cells[idx].value = value;
        self.notifier.queue(CellChange {
            address: addr,
            field: CellField::Value,
        });
        Ok(true)
    }
}

/// Shortest round-trip rendering of a formula result (`28`, `0.5`)
fn format_number(value: f64) -> String {
    value.to_string()
}
