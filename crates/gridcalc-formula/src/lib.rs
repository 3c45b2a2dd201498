//! # gridcalc-formula
//!
//! Expression engine for gridcalc.
//!
//! This crate provides:
//! - Infix → postfix parsing (shunting-yard)
//! - A node factory backed by a fixed operator table
//! - Arena-backed expression trees with variable binding
//!
//! Expressions use the four arithmetic operators, `^`, parentheses, decimal literals and
//! cell-style variables (`A1`, `B12`).
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_formula::{parse, ExpressionTree};
//!
//! let postfix = parse("A1+2*B1").unwrap();
//! let mut tree = ExpressionTree::new();
//! tree.build(&postfix).unwrap();
//! tree.gather_variable_values(&[("A1", 1.0), ("B1", 4.0)]);
//! assert_eq!(tree.evaluate().unwrap(), 9.0);
//! ```

pub mod ast;
pub mod error;
pub mod factory;
pub mod parser;
pub mod tree;

pub use ast::{Node, NodeId, OperatorKind, OperatorNode, VariableNode};
pub use error::{FormulaError, FormulaResult};
pub use factory::{create_node, is_variable_name};
pub use parser::parse;
pub use tree::ExpressionTree;
