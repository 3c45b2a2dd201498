//! # gridcalc-core
//!
//! Cell grid for the gridcalc engine.
//!
//! This crate provides:
//! - [`Grid`] - A fixed-size grid of cells whose formulas are recalculated when the cells
//!   they read change
//! - [`CellAddress`], [`Cell`] and [`Color`] - Cell locations and contents
//! - [`CellCommand`], [`CommandBatch`] and [`History`] - Undo/redo of cell changes
//! - [`CellRecord`] - Snapshot records for saving and restoring modified cells
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellAddress, CellCommand, Grid};
//!
//! let mut grid = Grid::new(50, 26).unwrap();
//! grid.set_text("A1", "3").unwrap();
//! grid.set_text("B1", "=A1*A1+1").unwrap();
//! assert_eq!(grid.cell("B1").unwrap().unwrap().value(), "10");
//!
//! let a1 = CellAddress::parse("A1").unwrap();
//! let command = CellCommand::text(&grid, a1, "5").unwrap();
//! grid.execute(command.into()).unwrap();
//! assert_eq!(grid.cell("B1").unwrap().unwrap().value(), "26");
//!
//! grid.undo().unwrap();
//! assert_eq!(grid.cell("B1").unwrap().unwrap().value(), "10");
//! ```

pub mod cell;
pub mod command;
pub mod config;
pub mod dependency;
pub mod error;
pub mod grid;
pub mod notify;
pub mod snapshot;

// Re-exports for convenience
pub use cell::{Cell, CellAddress, Color};
pub use command::{CellCommand, CommandBatch, History};
pub use config::GridConfig;
pub use dependency::{DependencyGraph, RecalcOrder};
pub use error::{Error, Result};
pub use grid::Grid;
pub use notify::{CellChange, CellField, SubscriptionId};
pub use snapshot::{replay_order, CellRecord};

pub use gridcalc_formula::FormulaError;

/// Maximum number of rows in a grid
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a grid
pub const MAX_COLS: u16 = 16_384;

/// Maximum number of cells in a grid, whatever its shape
pub const MAX_CELLS: usize = 1 << 22;
