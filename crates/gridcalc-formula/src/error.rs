//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing, building or evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The scanner met a character outside digits, letters, `.`, operators and parentheses
    #[error("Unknown character '{character}' at position {position}")]
    UnknownCharacter { character: char, position: usize },

    /// The right operand of a division evaluated to zero
    #[error("Division by zero")]
    DivisionByZero,

    /// The node factory could not classify a token
    #[error("Unrecognized token: '{0}'")]
    Unimplemented(String),

    /// A digit-led token that is not a number
    #[error("Invalid number literal: '{0}'")]
    InvalidNumber(String),

    /// The postfix sequence does not describe a single tree
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// An operator node was evaluated before its children were attached
    #[error("Operator node has no operands")]
    UnattachedOperator,
}
