//! Arithmetic retention expressions
//!
//! Retention counts may be written as simple integer arithmetic (`21 * 2`,
//! `24 * 7`, `(52 + 1) - 1`). Supported: `+ - * /`, unary minus and
//! parentheses. Division must be exact.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("{0} / {1} is not a whole number")]
    InexactDivision(i64, i64),
    #[error("number out of range")]
    Overflow,
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

const MAX_DEPTH: usize = 64;

/// Evaluate an integer expression
pub fn evaluate(input: &str) -> Result<i64, ExprError> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(c) => Err(ExprError::UnexpectedChar(c as char, parser.pos)),
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_operator(&mut self, operators: &[u8]) -> Option<u8> {
        self.skip_whitespace();
        let c = self.peek().filter(|c| operators.contains(c))?;
        self.pos += 1;
        Some(c)
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<i64, ExprError> {
        let mut value = self.term()?;
        while let Some(op) = self.next_operator(b"+-") {
            let rhs = self.term()?;
            value = match op {
                b'+' => value.checked_add(rhs),
                _ => value.checked_sub(rhs),
            }
            .ok_or(ExprError::Overflow)?;
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<i64, ExprError> {
        let mut value = self.factor()?;
        while let Some(op) = self.next_operator(b"*/") {
            let rhs = self.factor()?;
            value = if op == b'*' {
                value.checked_mul(rhs).ok_or(ExprError::Overflow)?
            } else if rhs == 0 {
                return Err(ExprError::DivisionByZero);
            } else if value % rhs != 0 {
                return Err(ExprError::InexactDivision(value, rhs));
            } else {
                value.checked_div(rhs).ok_or(ExprError::Overflow)?
            };
        }
        Ok(value)
    }

    // factor := '-' factor | '(' expression ')' | digits
    fn factor(&mut self) -> Result<i64, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = self.unary();
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> Result<i64, ExprError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some(b'-') => {
                self.pos += 1;
                self.factor()?.checked_neg().ok_or(ExprError::Overflow)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expression()?;
                self.skip_whitespace();
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(c) => Err(ExprError::UnexpectedChar(c as char, self.pos)),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                // The slice is ASCII digits only
                std::str::from_utf8(&self.input[start..self.pos])
                    .ok()
                    .and_then(|digits| digits.parse().ok())
                    .ok_or(ExprError::Overflow)
            }
            Some(c) => Err(ExprError::UnexpectedChar(c as char, self.pos)),
        }
    }
}
