//! Cell contents

use super::{CellAddress, Color};

/// A single cell of the grid
///
/// `text` is what was entered; `value` is what is displayed. They are equal for plain text
/// and differ for formulas, whose value is the evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub(crate) address: CellAddress,
    pub(crate) text: String,
    pub(crate) value: String,
    pub(crate) color: Color,
}

impl Cell {
    /// Create an empty, uncolored cell
    pub fn new(address: CellAddress) -> Self {
        Self {
            address,
            text: String::new(),
            value: String::new(),
            color: Color::NONE,
        }
    }

    /// The cell's fixed location
    pub fn address(&self) -> CellAddress {
        self.address
    }

    /// Row index (0-based)
    pub fn row(&self) -> u32 {
        self.address.row
    }

    /// Column index (0-based)
    pub fn col(&self) -> u16 {
        self.address.col
    }

    /// A1-style name, e.g. `"B5"`
    pub fn name(&self) -> String {
        self.address.to_a1_string()
    }

    /// Raw text as entered
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Assigned color, [`Color::NONE`] if none
    pub fn color(&self) -> Color {
        self.color
    }

    /// Check if the text is a formula (`=`-prefixed)
    pub fn is_formula(&self) -> bool {
        self.text.starts_with('=')
    }

    /// The display value as a number, if it reads as one
    pub fn numeric_value(&self) -> Option<f64> {
        self.value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    }

    /// Check if the cell holds nothing and has no color
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.color.is_set()
    }
}
