//! Error types for gridcalc-core

use gridcalc_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridcalc-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Parsing, building or evaluating a formula failed
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// A formula references a cell that holds nothing
    #[error("Cell {0} has not been initialized")]
    UninitializedCell(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// A formula variable that names no cell of the grid
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    /// Grid dimensions hold more cells than can be allocated
    #[error("Grid of {rows}x{cols} cells exceeds the limit of {limit} cells")]
    GridTooLarge { rows: u32, cols: u16, limit: usize },

    /// Recalculation reached cells that read each other in a cycle
    #[error("Circular reference detected involving cell {0}")]
    CircularReference(String),

    /// Recalculation went deeper than the configured bound
    #[error("Recalculation of {cell} exceeded the cascade depth limit of {limit}")]
    CascadeDepthExceeded { cell: String, limit: usize },

    /// A dependent cell failed to recalculate after an upstream change
    #[error("Recalculating {cell} failed: {source}")]
    Recalculation {
        cell: String,
        #[source]
        source: Box<Error>,
    },

    /// Undo or redo requested with nothing on the stack
    #[error("Nothing to {0}")]
    EmptyHistory(&'static str),

    /// Saved cells reference each other in a cycle and cannot be replayed
    #[error("No replay order exists for cells: {}", .0.join(", "))]
    UnresolvableRestoreOrder(Vec<String>),
}

impl Error {
    /// Wrap an error raised while recalculating `cell`
    pub(crate) fn recalculation<S: Into<String>>(cell: S, source: Error) -> Self {
        Error::Recalculation {
            cell: cell.into(),
            source: Box::new(source),
        }
    }
}
