//! Expression trees
//!
//! An [`ExpressionTree`] owns an arena of [`Node`]s, the id of its root and a table of
//! variable values. Building replaces the arena wholesale; the variable table survives
//! rebuilds so that values bound before a build still apply afterwards.

use crate::ast::{Node, NodeId, OperatorNode};
use crate::error::{FormulaError, FormulaResult};
use crate::factory::create_node;
use crate::parser::parse;
use ahash::AHashMap;

/// An evaluatable expression tree
#[derive(Debug, Clone, Default)]
pub struct ExpressionTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    variables: AHashMap<String, f64>,
}

impl ExpressionTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an infix expression and build a tree from it
    ///
    /// # Example
    /// ```rust
    /// use gridcalc_formula::ExpressionTree;
    ///
    /// let mut tree = ExpressionTree::from_expression("A1*(B2-4)").unwrap();
    /// tree.set_variable("A1", 3.0);
    /// tree.set_variable("B2", 10.0);
    /// tree.search_and_add_variable_values();
    /// assert_eq!(tree.evaluate().unwrap(), 18.0);
    /// ```
    pub fn from_expression(expression: &str) -> FormulaResult<Self> {
        let mut tree = Self::new();
        tree.build(&parse(expression)?)?;
        Ok(tree)
    }

    /// Rebuild the tree from a postfix token sequence.
    ///
    /// An empty sequence leaves the tree empty. Every variable met is registered in the
    /// variable table with value 0 unless the table already holds it.
    pub fn build<S: AsRef<str>>(&mut self, postfix: &[S]) -> FormulaResult<()> {
        self.nodes.clear();
        self.root = None;

        match self.push_postfix(postfix) {
            Ok(root) => {
                self.root = root;
                log::trace!("built expression tree with {} nodes", self.nodes.len());
                Ok(())
            }
            Err(err) => {
                self.nodes.clear();
                Err(err)
            }
        }
    }

    /// Evaluate the tree; an empty tree evaluates to `0.0`
    ///
    /// Nodes are stored children first, so one forward pass over the arena evaluates every
    /// operand before the operator reading it.
    pub fn evaluate(&self) -> FormulaResult<f64> {
        let root = match self.root {
            Some(root) => root,
            None => return Ok(0.0),
        };

        let mut values: Vec<f64> = Vec::with_capacity(root.0 + 1);
        for node in &self.nodes[..=root.0] {
            let value = match node {
                Node::Numeric(value) => *value,
                Node::Variable(var) => self.variable(&var.name).unwrap_or(var.value),
                Node::Operator(op) => Self::evaluate_operator(op, &values)?,
            };
            values.push(value);
        }
        values.pop().ok_or(FormulaError::UnattachedOperator)
    }

    /// Insert or replace a variable value in the table
    pub fn set_variable<S: Into<String>>(&mut self, name: S, value: f64) {
        self.variables.insert(name.into(), value);
    }

    /// Value currently held in the table for a variable
    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    /// Push every table value into the variable nodes carrying that name
    pub fn search_and_add_variable_values(&mut self) {
        if self.variables.is_empty() {
            return;
        }
        for node in &mut self.nodes {
            if let Node::Variable(var) = node {
                if let Some(&value) = self.variables.get(&var.name) {
                    var.value = value;
                }
            }
        }
    }

    /// Bind a batch of resolved values and push them into the tree
    pub fn gather_variable_values<S: AsRef<str>>(&mut self, values: &[(S, f64)]) {
        for (name, value) in values {
            self.variables.insert(name.as_ref().to_string(), *value);
        }
        self.search_and_add_variable_values();
    }

    /// Distinct variable names, left subtree before right subtree
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Some(Node::Operator(op)) => {
                    if let Ok((left, right)) = op.children() {
                        stack.push(right);
                        stack.push(left);
                    }
                }
                Some(Node::Variable(var)) => {
                    if !names.contains(&var.name) {
                        names.push(var.name.clone());
                    }
                }
                Some(Node::Numeric(_)) | None => {}
            }
        }
        names
    }

    /// Root node id, if the tree is not empty
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Check if no expression has been built
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Push the postfix tokens into the arena, returning the root
    fn push_postfix<S: AsRef<str>>(&mut self, postfix: &[S]) -> FormulaResult<Option<NodeId>> {
        let mut operands: Vec<NodeId> = Vec::new();
        for token in postfix {
            let token = token.as_ref();
            let id = match create_node(token)? {
                Node::Operator(mut op) => {
                    let right = Self::pop_operand(&mut operands, token)?;
                    let left = Self::pop_operand(&mut operands, token)?;
                    op.attach(left, right);
                    self.push_node(Node::Operator(op))
                }
                Node::Variable(var) => {
                    self.variables.entry(var.name.clone()).or_insert(var.value);
                    self.push_node(Node::Variable(var))
                }
                leaf => self.push_node(leaf),
            };
            operands.push(id);
        }

        match operands.len() {
            0 | 1 => Ok(operands.pop()),
            n => Err(FormulaError::MalformedExpression(format!(
                "{} operands left without an operator",
                n
            ))),
        }
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn pop_operand(operands: &mut Vec<NodeId>, operator: &str) -> FormulaResult<NodeId> {
        operands.pop().ok_or_else(|| {
            FormulaError::MalformedExpression(format!("missing operand for '{}'", operator))
        })
    }

    fn evaluate_operator(op: &OperatorNode, values: &[f64]) -> FormulaResult<f64> {
        let (left, right) = op.children()?;
        // Both sides are already evaluated when the division check runs
        match (values.get(left.0), values.get(right.0)) {
            (Some(&left), Some(&right)) => op.kind.apply(left, right),
            _ => Err(FormulaError::UnattachedOperator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::OperatorKind;
    use pretty_assertions::assert_eq;

    fn eval(expression: &str) -> FormulaResult<f64> {
        ExpressionTree::from_expression(expression)?.evaluate()
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("20+40*2/(17-7)").unwrap(), 28.0);
        assert_eq!(eval("((((17-7))))").unwrap(), 10.0);
        assert_eq!(eval("10-4-3").unwrap(), 3.0);
        assert_eq!(eval("8/4/2").unwrap(), 1.0);
        assert_eq!(eval("2^3").unwrap(), 8.0);
        assert_eq!(eval("2*3^2").unwrap(), 18.0);
        assert_eq!(eval("1.5+1.25").unwrap(), 2.75);
    }

    #[test]
    fn test_operand_order() {
        let tree = ExpressionTree::from_expression("9-2").unwrap();
        let root = tree.root().unwrap();
        if let Some(Node::Operator(op)) = tree.node(root) {
            assert_eq!(op.kind, OperatorKind::Subtraction);
            assert_eq!(tree.node(op.left().unwrap()), Some(&Node::Numeric(9.0)));
            assert_eq!(tree.node(op.right().unwrap()), Some(&Node::Numeric(2.0)));
        } else {
            panic!("Expected operator root");
        }
        assert_eq!(tree.evaluate().unwrap(), 7.0);
    }

    #[test]
    fn test_empty_tree() {
        let tree = ExpressionTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.evaluate().unwrap(), 0.0);

        let mut tree = ExpressionTree::from_expression("1+1").unwrap();
        tree.build::<&str>(&[]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.evaluate().unwrap(), 0.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("3/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("3/(2-2)"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("0/3").unwrap(), 0.0);
    }

    #[test]
    fn test_malformed_postfix() {
        let mut tree = ExpressionTree::new();
        assert!(matches!(
            tree.build(&["1", "+"]),
            Err(FormulaError::MalformedExpression(_))
        ));
        assert!(matches!(
            tree.build(&["1", "2"]),
            Err(FormulaError::MalformedExpression(_))
        ));
        assert!(tree.is_empty());

        // Unary minus is not part of the grammar
        assert!(matches!(eval("-5"), Err(FormulaError::MalformedExpression(_))));
        // An unmatched '(' reaches the factory
        assert_eq!(eval("(1+2"), Err(FormulaError::Unimplemented("(".into())));
    }

    #[test]
    fn test_failed_build_leaves_no_nodes() {
        let mut tree = ExpressionTree::from_expression("1+2").unwrap();
        assert!(tree.build(&["1", "2", "+", "+"]).is_err());
        assert!(tree.is_empty());
        assert!(tree.node(NodeId(0)).is_none());

        assert_eq!(
            tree.build(&["1", "x"]),
            Err(FormulaError::Unimplemented("x".into()))
        );
        assert!(tree.node(NodeId(0)).is_none());
    }

    #[test]
    fn test_long_expression() {
        let expression = vec!["1"; 200_000].join("+");
        let tree = ExpressionTree::from_expression(&expression).unwrap();
        assert_eq!(tree.evaluate().unwrap(), 200_000.0);

        let expression = vec!["A1"; 100_000].join("-");
        let tree = ExpressionTree::from_expression(&expression).unwrap();
        assert_eq!(tree.variable_names(), vec!["A1"]);
    }

    #[test]
    fn test_variables_default_to_zero() {
        let tree = ExpressionTree::from_expression("A1+5").unwrap();
        assert_eq!(tree.variable("A1"), Some(0.0));
        assert_eq!(tree.evaluate().unwrap(), 5.0);
    }

    #[test]
    fn test_set_variable_and_push_into_nodes() {
        let mut tree = ExpressionTree::from_expression("A1*A1+B2").unwrap();
        tree.set_variable("A1", 3.0);
        tree.set_variable("B2", 1.0);
        tree.search_and_add_variable_values();

        let values: Vec<f64> = (0..3)
            .filter_map(|i| match tree.node(NodeId(i)) {
                Some(Node::Variable(var)) => Some(var.value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![3.0, 3.0]);
        assert_eq!(tree.evaluate().unwrap(), 10.0);
    }

    #[test]
    fn test_variable_table_survives_rebuild() {
        let mut tree = ExpressionTree::new();
        tree.set_variable("C3", 4.0);
        tree.build(&parse("C3*2").unwrap()).unwrap();
        assert_eq!(tree.variable("C3"), Some(4.0));
        assert_eq!(tree.evaluate().unwrap(), 8.0);
    }

    #[test]
    fn test_gather_variable_values() {
        let mut tree = ExpressionTree::from_expression("A1/B1").unwrap();
        tree.gather_variable_values(&[("A1", 9.0), ("B1", 3.0)]);
        assert_eq!(tree.evaluate().unwrap(), 3.0);

        tree.gather_variable_values(&[("B1", 0.0)]);
        assert_eq!(tree.evaluate(), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_variable_names_order() {
        let tree = ExpressionTree::from_expression("B2*(A1+B2)-C3").unwrap();
        assert_eq!(tree.variable_names(), vec!["B2", "A1", "C3"]);

        let tree = ExpressionTree::from_expression("4+5").unwrap();
        assert!(tree.variable_names().is_empty());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let postfix = parse("7*A2-3/B1").unwrap();
        let mut first = ExpressionTree::new();
        first.build(&postfix).unwrap();
        first.gather_variable_values(&[("A2", 2.0), ("B1", 4.0)]);

        let mut second = ExpressionTree::new();
        second.build(&postfix).unwrap();
        second.gather_variable_values(&[("A2", 2.0), ("B1", 4.0)]);

        assert_eq!(first.evaluate().unwrap(), second.evaluate().unwrap());
        assert_eq!(first.evaluate().unwrap(), 13.25);
    }
}
