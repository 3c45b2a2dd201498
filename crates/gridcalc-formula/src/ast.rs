//! Expression tree node types
//!
//! Nodes live in an arena owned by [`ExpressionTree`](crate::ExpressionTree) and refer to
//! their children by [`NodeId`]. Only operator nodes have children.

use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Index of a node inside its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Binary operators understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Exponent,
}

impl OperatorKind {
    /// Every operator, in table order
    pub const ALL: [OperatorKind; 5] = [
        OperatorKind::Addition,
        OperatorKind::Subtraction,
        OperatorKind::Multiplication,
        OperatorKind::Division,
        OperatorKind::Exponent,
    ];

    /// The operator's symbol as it appears in an expression
    pub const fn symbol(self) -> char {
        match self {
            OperatorKind::Addition => '+',
            OperatorKind::Subtraction => '-',
            OperatorKind::Multiplication => '*',
            OperatorKind::Division => '/',
            OperatorKind::Exponent => '^',
        }
    }

    /// Precedence rank: `+ -` = 1, `* /` = 2, `^` = 3
    pub const fn precedence(self) -> u8 {
        match self {
            OperatorKind::Addition | OperatorKind::Subtraction => 1,
            OperatorKind::Multiplication | OperatorKind::Division => 2,
            OperatorKind::Exponent => 3,
        }
    }

    /// Combine two already-evaluated operands.
    ///
    /// Division checks the right operand and fails instead of producing an infinity.
    pub fn apply(self, left: f64, right: f64) -> FormulaResult<f64> {
        match self {
            OperatorKind::Addition => Ok(left + right),
            OperatorKind::Subtraction => Ok(left - right),
            OperatorKind::Multiplication => Ok(left * right),
            OperatorKind::Division => {
                if right == 0.0 {
                    Err(FormulaError::DivisionByZero)
                } else {
                    Ok(left / right)
                }
            }
            OperatorKind::Exponent => Ok(left.powf(right)),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A variable leaf: a cell-style name plus the value currently bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode {
    pub name: String,
    pub value: f64,
}

impl VariableNode {
    /// Create an unresolved variable (value 0)
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            value: 0.0,
        }
    }
}

/// An operator with its two operand slots
///
/// The factory creates operators detached; the tree builder attaches the operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorNode {
    pub kind: OperatorKind,
    children: Option<(NodeId, NodeId)>,
}

impl OperatorNode {
    /// Create an operator with no operands attached yet
    pub fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            children: None,
        }
    }

    /// Attach the left and right operands
    pub fn attach(&mut self, left: NodeId, right: NodeId) {
        self.children = Some((left, right));
    }

    /// Left operand, if attached
    pub fn left(&self) -> Option<NodeId> {
        self.children.map(|(left, _)| left)
    }

    /// Right operand, if attached
    pub fn right(&self) -> Option<NodeId> {
        self.children.map(|(_, right)| right)
    }

    /// Both operands, or an error when the operator is still detached
    pub fn children(&self) -> FormulaResult<(NodeId, NodeId)> {
        self.children.ok_or(FormulaError::UnattachedOperator)
    }

    /// Precedence of this operator
    pub fn precedence(&self) -> u8 {
        self.kind.precedence()
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Numeric literal
    Numeric(f64),
    /// Variable reference
    Variable(VariableNode),
    /// Binary operator
    Operator(OperatorNode),
}

impl Node {
    /// Check if this node is an operator
    pub fn is_operator(&self) -> bool {
        matches!(self, Node::Operator(_))
    }

    /// Variable name, if this node is a variable
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Node::Variable(var) => Some(&var.name),
            _ => None,
        }
    }
}
