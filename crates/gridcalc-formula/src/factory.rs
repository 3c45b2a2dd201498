//! Token → node classification
//!
//! The operator table is built once, on first use, and never changes afterwards. Both the
//! scanner and the tree builder consult it.

use crate::ast::{Node, OperatorKind, OperatorNode, VariableNode};
use crate::error::{FormulaError, FormulaResult};
use ahash::AHashMap;
use lazy_regex::regex_is_match;
use once_cell::sync::Lazy;

/// Operator symbol → operator kind
static OPERATOR_TABLE: Lazy<AHashMap<char, OperatorKind>> = Lazy::new(|| {
    OperatorKind::ALL
        .iter()
        .map(|&kind| (kind.symbol(), kind))
        .collect()
});

/// Look up the operator for a single-character symbol
pub fn operator_for(symbol: char) -> Option<OperatorKind> {
    OPERATOR_TABLE.get(&symbol).copied()
}

/// Check if a character is a known operator symbol
pub fn is_operator(symbol: char) -> bool {
    OPERATOR_TABLE.contains_key(&symbol)
}

/// Precedence of an operator token, or `None` for anything else
pub fn precedence(token: &str) -> Option<u8> {
    single_char(token)
        .and_then(operator_for)
        .map(OperatorKind::precedence)
}

/// Check if a token has the shape of a variable: one letter followed by digits
pub fn is_variable_name(token: &str) -> bool {
    regex_is_match!(r"^[A-Za-z][0-9]+$", token)
}

/// Create the node a postfix token stands for.
///
/// Operators come back detached; the tree builder attaches their operands.
///
/// # Example
/// ```rust
/// use gridcalc_formula::{create_node, Node};
///
/// assert_eq!(create_node("42").unwrap(), Node::Numeric(42.0));
/// assert!(create_node("*").unwrap().is_operator());
/// assert_eq!(create_node("B12").unwrap().variable_name(), Some("B12"));
/// assert!(create_node("(").is_err());
/// ```
pub fn create_node(token: &str) -> FormulaResult<Node> {
    if let Some(kind) = single_char(token).and_then(operator_for) {
        return Ok(Node::Operator(OperatorNode::new(kind)));
    }

    let first = token
        .chars()
        .next()
        .ok_or_else(|| FormulaError::Unimplemented(String::new()))?;

    if first.is_ascii_digit() {
        let value: f64 = token
            .parse()
            .map_err(|_| FormulaError::InvalidNumber(token.to_string()))?;
        return Ok(Node::Numeric(value));
    }

    if is_variable_name(token) {
        return Ok(Node::Variable(VariableNode::new(token)));
    }

    Err(FormulaError::Unimplemented(token.to_string()))
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table() {
        assert_eq!(operator_for('+'), Some(OperatorKind::Addition));
        assert_eq!(operator_for('-'), Some(OperatorKind::Subtraction));
        assert_eq!(operator_for('*'), Some(OperatorKind::Multiplication));
        assert_eq!(operator_for('/'), Some(OperatorKind::Division));
        assert_eq!(operator_for('^'), Some(OperatorKind::Exponent));
        assert_eq!(operator_for('%'), None);
        assert!(!is_operator('('));
    }

    #[test]
    fn test_precedence_lookup() {
        assert_eq!(precedence("+"), Some(1));
        assert_eq!(precedence("/"), Some(2));
        assert_eq!(precedence("^"), Some(3));
        assert_eq!(precedence("++"), None);
        assert_eq!(precedence("A1"), None);
    }

    #[test]
    fn test_create_numeric() {
        assert_eq!(create_node("3.25").unwrap(), Node::Numeric(3.25));
        assert_eq!(create_node("007").unwrap(), Node::Numeric(7.0));
        assert_eq!(
            create_node("1.2.3"),
            Err(FormulaError::InvalidNumber("1.2.3".into()))
        );
    }

    #[test]
    fn test_create_variable() {
        let node = create_node("a7").unwrap();
        assert_eq!(node, Node::Variable(VariableNode::new("a7")));
        if let Node::Variable(var) = node {
            assert_eq!(var.value, 0.0);
        }
    }

    #[test]
    fn test_create_operator() {
        match create_node("^").unwrap() {
            Node::Operator(op) => {
                assert_eq!(op.kind, OperatorKind::Exponent);
                assert_eq!(op.precedence(), 3);
                assert!(op.left().is_none());
            }
            other => panic!("Expected operator, got {:?}", other),
        }
    }

    #[test]
    fn test_unclassifiable_tokens() {
        assert_eq!(
            create_node("("),
            Err(FormulaError::Unimplemented("(".into()))
        );
        assert_eq!(
            create_node("AB1"),
            Err(FormulaError::Unimplemented("AB1".into()))
        );
        assert_eq!(
            create_node("A1B"),
            Err(FormulaError::Unimplemented("A1B".into()))
        );
        assert_eq!(create_node("x"), Err(FormulaError::Unimplemented("x".into())));
        assert!(create_node("").is_err());
    }
}
