//! Expression tree and evaluation

use std::cmp::Ordering;
use std::fmt;

use crate::error::FilterError;
use crate::expr::lexer::is_bare_identifier;
use crate::record::HostRecord;
use crate::value::AttributeValue;

/// Binary operators, logical and comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Source spelling of the operator
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// `&&` or `||`
    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// `<`, `<=`, `>` or `>=`
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Operator to use when the operands are swapped (`4 <= cores` is `cores >= 4`)
    #[must_use]
    pub fn mirror(self) -> Self {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => other,
        }
    }

    /// Whether `ordering` (field compared to literal) satisfies this operator
    #[must_use]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            BinaryOp::Eq => ordering == Ordering::Equal,
            BinaryOp::Ne => ordering != Ordering::Equal,
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            BinaryOp::And | BinaryOp::Or => false,
        }
    }
}

/// Compiled filter expression
///
/// The parser only produces trees whose comparisons have a field on one
/// side and a literal on the other, and whose logical operators combine
/// comparisons. Hand-built trees that break this shape fail evaluation with
/// [`FilterError::Evaluation`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(AttributeValue),
    Field(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Build a binary node
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate against one host
    ///
    /// `&&` and `||` short-circuit left to right. A comparison against a
    /// missing attribute is `false`, whatever the operator.
    ///
    /// # Errors
    /// Returns [`FilterError::Evaluation`] if the tree is not a predicate.
    pub fn evaluate(&self, record: &HostRecord) -> Result<bool, FilterError> {
        match self {
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => Ok(left.evaluate(record)? && right.evaluate(record)?),
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => Ok(left.evaluate(record)? || right.evaluate(record)?),
            Expr::Binary { op, left, right } => match (left.as_ref(), right.as_ref()) {
                (Expr::Field(field), Expr::Literal(literal)) => {
                    Ok(compare(*op, record.get(field), literal))
                }
                (Expr::Literal(literal), Expr::Field(field)) => {
                    Ok(compare(op.mirror(), record.get(field), literal))
                }
                _ => Err(FilterError::Evaluation(format!(
                    "`{self}` must compare a field with a literal"
                ))),
            },
            Expr::Literal(_) | Expr::Field(_) => Err(FilterError::Evaluation(format!(
                "`{self}` is not a predicate"
            ))),
        }
    }

    /// Field names referenced anywhere in the tree
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Field(name) => out.push(name),
            Expr::Literal(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }
}

/// Compare a field value with a literal
///
/// Boolean literals only match boolean fields (or strings spelling
/// `true`/`false`). Otherwise, when both sides read as numbers the
/// comparison is numeric, and lexicographic on the text form if not.
fn compare(op: BinaryOp, value: Option<&AttributeValue>, literal: &AttributeValue) -> bool {
    let Some(value) = value else {
        return false;
    };

    if let Some(expected) = literal.as_bool() {
        return match value {
            AttributeValue::Boolean(actual) => op.holds(actual.cmp(&expected)),
            AttributeValue::String(text) => op.holds(text.as_str().cmp(bool_text(expected))),
            AttributeValue::Integer(_) | AttributeValue::Float(_) => false,
        };
    }
    if value.as_bool().is_some() {
        return false;
    }

    if let (Some(lhs), Some(rhs)) = (value.as_number(), literal.as_number()) {
        return lhs.compare(rhs).is_some_and(|ordering| op.holds(ordering));
    }

    op.holds(value.to_string().cmp(&literal.to_string()))
}

fn bool_text(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(AttributeValue::String(s)) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Field(name) if is_bare_identifier(name) => f.write_str(name),
            Expr::Field(name) => {
                write!(f, "`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
            }
            Expr::Binary { op, left, right } if op.is_logical() => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Expr::Binary { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
        }
    }
}
