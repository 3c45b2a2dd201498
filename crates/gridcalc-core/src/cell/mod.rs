//! Cell-related types
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`Color`] - A packed ARGB cell color
//! - [`Cell`] - A cell's text, display value and color

mod address;
mod color;
mod data;

pub use address::CellAddress;
pub use color::Color;
pub use data::Cell;
