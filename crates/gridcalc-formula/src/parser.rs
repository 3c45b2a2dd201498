//! Expression parser
//!
//! A shunting-yard scanner that turns an infix expression into a postfix token sequence.
//! Letters, digits and `.` accumulate into a pending operand; operators and parentheses
//! flush it. Operators of greater-or-equal precedence are popped before a new operator is
//! pushed, so equal-precedence operators associate to the left.

use crate::error::{FormulaError, FormulaResult};
use crate::factory;

/// Parse an infix expression into postfix tokens
///
/// An input that contains no tokens yields an empty sequence.
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse;
///
/// let postfix = parse("20+40*2/(17-7)").unwrap();
/// assert_eq!(postfix, ["20", "40", "2", "*", "17", "7", "-", "/", "+"]);
/// assert!(parse("").unwrap().is_empty());
/// ```
pub fn parse(expression: &str) -> FormulaResult<Vec<String>> {
    let mut parser = ShuntingYard::default();

    for (position, c) in expression.chars().enumerate() {
        if factory::is_operator(c) {
            parser.flush_pending();
            parser.push_operator(c);
        } else if c == '(' {
            parser.operators.push('(');
        } else if c == ')' {
            parser.flush_pending();
            parser.close_parenthesis();
        } else if c.is_ascii_digit() || c.is_alphabetic() || c == '.' {
            parser.pending.push(c);
        } else {
            return Err(FormulaError::UnknownCharacter {
                character: c,
                position,
            });
        }
    }

    let postfix = parser.finish();
    log::trace!("parsed '{}' into postfix {:?}", expression, postfix);
    Ok(postfix)
}

/// Scanner state: the pending operand, the operator stack and the output
#[derive(Debug, Default)]
struct ShuntingYard {
    output: Vec<String>,
    operators: Vec<char>,
    pending: String,
}

impl ShuntingYard {
    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            self.output.push(std::mem::take(&mut self.pending));
        }
    }

    fn push_operator(&mut self, op: char) {
        let rank = Self::rank(op);
        while let Some(&top) = self.operators.last() {
            if top == '(' || Self::rank(top) < rank {
                break;
            }
            self.output.push(top.to_string());
            self.operators.pop();
        }
        self.operators.push(op);
    }

    /// Pop operators until the matching `(`, which is discarded.
    ///
    /// A `)` without a matching `(` drains the whole stack.
    fn close_parenthesis(&mut self) {
        while let Some(top) = self.operators.pop() {
            if top == '(' {
                return;
            }
            self.output.push(top.to_string());
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush_pending();
        while let Some(op) = self.operators.pop() {
            self.output.push(op.to_string());
        }
        self.output
    }

    fn rank(op: char) -> u8 {
        factory::operator_for(op).map_or(0, |kind| kind.precedence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_precedence() {
        assert_eq!(parse("1+2*3").unwrap(), ["1", "2", "3", "*", "+"]);
        assert_eq!(parse("1*2+3").unwrap(), ["1", "2", "*", "3", "+"]);
    }

    #[test]
    fn test_parse_left_associative() {
        assert_eq!(parse("10-4-3").unwrap(), ["10", "4", "-", "3", "-"]);
        assert_eq!(parse("8/4/2").unwrap(), ["8", "4", "/", "2", "/"]);
        assert_eq!(parse("2^3^2").unwrap(), ["2", "3", "^", "2", "^"]);
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(
            parse("20+40*2/(17-7)").unwrap(),
            ["20", "40", "2", "*", "17", "7", "-", "/", "+"]
        );
        assert_eq!(parse("((((17-7))))").unwrap(), ["17", "7", "-"]);
        assert_eq!(parse("(1+2)*3").unwrap(), ["1", "2", "+", "3", "*"]);
    }

    #[test]
    fn test_parse_variables_and_decimals() {
        assert_eq!(
            parse("A1*2.5+B10").unwrap(),
            ["A1", "2.5", "*", "B10", "+"]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("()").unwrap().is_empty());
    }

    #[test]
    fn test_parse_single_token() {
        assert_eq!(parse("42").unwrap(), ["42"]);
    }

    #[test]
    fn test_parse_unknown_character() {
        assert_eq!(
            parse("1+2%3"),
            Err(FormulaError::UnknownCharacter {
                character: '%',
                position: 3
            })
        );
        assert_eq!(
            parse("1 + 2"),
            Err(FormulaError::UnknownCharacter {
                character: ' ',
                position: 1
            })
        );
    }

    #[test]
    fn test_parse_unbalanced_parentheses() {
        // An unmatched '(' survives into the output for the builder to reject
        assert_eq!(parse("(1+2").unwrap(), ["1", "2", "+", "("]);
        // An unmatched ')' is absorbed
        assert_eq!(parse("1+2)").unwrap(), ["1", "2", "+"]);
    }
}
