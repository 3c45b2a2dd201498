//! Grid configuration

/// Default number of rows
pub const DEFAULT_ROWS: u32 = 50;

/// Default number of columns (A through Z)
pub const DEFAULT_COLS: u16 = 26;

/// Options for building a [`Grid`](crate::Grid)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Number of rows (default: 50)
    pub rows: u32,
    /// Number of columns (default: 26)
    pub cols: u16,
    /// Maximum depth of a recalculation cascade; `None` uses the number of cells
    pub max_cascade_depth: Option<usize>,
}

impl GridConfig {
    /// Configuration for a grid of the given size
    pub fn new(rows: u32, cols: u16) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Set the cascade depth bound
    pub fn with_max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = Some(depth);
        self
    }

    /// Depth bound in effect for this configuration
    pub fn cascade_limit(&self) -> usize {
        self.max_cascade_depth
            .unwrap_or_else(|| (self.rows as usize).saturating_mul(self.cols as usize))
            .max(1)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            max_cascade_depth: None,
        }
    }
}
