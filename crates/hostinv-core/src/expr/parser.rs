//! Recursive-descent parser for filter expressions
//!
//! ```text
//! expr       := or
//! or         := and ( "||" and )*
//! and        := primary ( "&&" primary )*
//! primary    := "(" or ")" | comparison
//! comparison := operand cmp-op operand
//! operand    := field | literal
//! ```
//!
//! Both logical operators are left-associative and `&&` binds tighter
//! than `||`. Parentheses are accepted as an extension; they do not change
//! how unparenthesized input is grouped.

use crate::error::FilterError;
use crate::expr::ast::{BinaryOp, Expr};
use crate::expr::lexer::{Token, TokenKind, tokenize};
use crate::value::AttributeValue;

/// Parse `expression` into an evaluable tree
///
/// # Errors
/// Returns [`FilterError::Syntax`] for malformed input and
/// [`FilterError::UnsupportedExpression`] for comparisons that do not have
/// exactly one field and one literal.
pub fn parse(expression: &str) -> Result<Expr, FilterError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
    };

    if parser.tokens.is_empty() {
        return Err(parser.syntax(0, "empty expression"));
    }

    let expr = parser.or()?;
    if let Some(token) = parser.peek() {
        let message = format!("unexpected {} after complete expression", token.kind);
        return Err(parser.syntax(token.offset, message));
    }
    Ok(expr)
}

enum Operand {
    Field(String),
    Literal(AttributeValue),
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_op(&mut self, op: BinaryOp) -> bool {
        if matches!(self.peek(), Some(Token { kind: TokenKind::Op(found), .. }) if *found == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn syntax(&self, offset: usize, message: impl Into<String>) -> FilterError {
        FilterError::Syntax {
            expression: self.expression.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn unsupported(&self, message: impl Into<String>) -> FilterError {
        FilterError::UnsupportedExpression {
            expression: self.expression.to_string(),
            message: message.into(),
        }
    }

    fn end_of_input(&self, expected: &str) -> FilterError {
        self.syntax(
            self.expression.len(),
            format!("unexpected end of expression, expected {expected}"),
        )
    }

    fn or(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.and()?;
        while self.eat_op(BinaryOp::Or) {
            let right = self.and()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.primary()?;
        while self.eat_op(BinaryOp::And) {
            let right = self.primary()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, FilterError> {
        let Some(token) = self.peek() else {
            return Err(self.end_of_input("a comparison"));
        };
        if token.kind != TokenKind::LParen {
            return self.comparison();
        }

        let open = token.offset;
        self.pos += 1;
        let inner = self.or()?;
        match self.advance() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(inner),
            Some(token) => Err(self.syntax(
                token.offset,
                format!("expected `)`, found {}", token.kind),
            )),
            None => Err(self.syntax(open, "unclosed `(`")),
        }
    }

    fn comparison(&mut self) -> Result<Expr, FilterError> {
        let start = self.peek().map_or(self.expression.len(), |t| t.offset);
        let left = self.operand()?;

        let op = match self.advance() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) if !op.is_logical() => op,
            Some(token) => {
                return Err(self.syntax(
                    token.offset,
                    format!("expected a comparison operator, found {}", token.kind),
                ));
            }
            None => return Err(self.end_of_input("a comparison operator")),
        };

        let right = self.operand()?;
        let text = self.expression[start..self.span_end()].trim();

        let (field, literal, op) = match (left, right) {
            (Operand::Field(field), Operand::Literal(literal)) => (field, literal, op),
            (Operand::Literal(literal), Operand::Field(field)) => (field, literal, op.mirror()),
            (Operand::Field(_), Operand::Field(right)) => {
                return Err(self.unsupported(format!(
                    "`{text}` compares two fields; quote '{right}' to compare against a string"
                )));
            }
            (Operand::Literal(_), Operand::Literal(_)) => {
                return Err(self.unsupported(format!("`{text}` compares two literals")));
            }
        };

        if op.is_ordering() && matches!(literal, AttributeValue::Boolean(_)) {
            return Err(self.unsupported(format!(
                "`{text}` orders against a boolean; only == and != apply"
            )));
        }

        Ok(Expr::binary(op, Expr::Field(field), Expr::Literal(literal)))
    }

    fn operand(&mut self) -> Result<Operand, FilterError> {
        let Some(token) = self.advance() else {
            return Err(self.end_of_input("a field name or literal"));
        };
        let operand = match token.kind {
            TokenKind::Ident(name) => Operand::Field(name),
            TokenKind::Str(s) => Operand::Literal(AttributeValue::String(s)),
            TokenKind::Int(n) => Operand::Literal(AttributeValue::Integer(n)),
            TokenKind::Float(n) => Operand::Literal(AttributeValue::Float(n)),
            TokenKind::Bool(b) => Operand::Literal(AttributeValue::Boolean(b)),
            other => {
                return Err(self.syntax(
                    token.offset,
                    format!("expected a field name or literal, found {other}"),
                ));
            }
        };
        Ok(operand)
    }

    /// Offset just past the last consumed token
    fn span_end(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.expression.len(), |t| t.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Expr {
        Expr::Field(name.to_string())
    }

    fn lit(value: impl Into<AttributeValue>) -> Expr {
        Expr::Literal(value.into())
    }

    #[test]
    fn test_parse_single_comparison() {
        assert_eq!(
            parse("cores>=4").unwrap(),
            Expr::binary(BinaryOp::Ge, field("cores"), lit(4i64))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("a==1 || b==2 && c==3").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Or,
                Expr::binary(BinaryOp::Eq, field("a"), lit(1i64)),
                Expr::binary(
                    BinaryOp::And,
                    Expr::binary(BinaryOp::Eq, field("b"), lit(2i64)),
                    Expr::binary(BinaryOp::Eq, field("c"), lit(3i64)),
                ),
            )
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = parse("a==1 || b==2 || c==3").unwrap();
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn test_parentheses_group() {
        let expr = parse("(a==1 || b==2) && c==3").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_literal_first_is_mirrored() {
        assert_eq!(
            parse("4 < cores").unwrap(),
            Expr::binary(BinaryOp::Gt, field("cores"), lit(4i64))
        );
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            ("", 0),
            ("cores>=", 7),
            ("&& cores>=4", 0),
            ("cores>=4 &&", 11),
            ("cores 4", 6),
            ("(cores>=4", 0),
            ("cores>=4)", 8),
            ("a==1 b==2", 5),
            ("a==(1)", 3),
        ];
        for (expression, offset) in cases {
            match parse(expression) {
                Err(FilterError::Syntax { offset: found, .. }) => {
                    assert_eq!(found, offset, "wrong offset for {expression:?}");
                }
                other => panic!("expected syntax error for {expression:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unsupported_shapes() {
        for expression in ["site==AMS", "1==1", "monitored > true"] {
            assert!(
                matches!(
                    parse(expression),
                    Err(FilterError::UnsupportedExpression { .. })
                ),
                "{expression}"
            );
        }
    }

    #[test]
    fn test_unsupported_message_names_comparison() {
        let err = parse("cores>=4 && site == AMS").unwrap_err();
        assert!(err.to_string().contains("`site == AMS`"), "{err}");
    }
}
