//! Filter expression engine
//!
//! Compiles strings such as `processor=='intel' && cores>=4` into a
//! [`Filter`] that can be evaluated against any number of host records.

pub mod ast;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::FilterError;
use crate::record::HostRecord;

pub use ast::{BinaryOp, Expr};

/// A compiled, immutable filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    source: String,
    expr: Expr,
}

impl Filter {
    /// Compile filter text
    ///
    /// A bare field name starts with a letter or `_` and continues with
    /// letters, digits, `_`, `.` or `-` (`os.release-name`, `café`). Any other
    /// field name is written between backticks, with `\\` and `` \` ``
    /// escapes: `` `2nd nic` == 'eth1' ``.
    ///
    /// # Errors
    /// Returns [`FilterError::Syntax`] or [`FilterError::UnsupportedExpression`]
    /// when the text is not a valid filter.
    pub fn compile(source: &str) -> Result<Self, FilterError> {
        let expr = parser::parse(source)?;
        debug!(filter = %source, compiled = %expr, "filter compiled");
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Whether `record` satisfies the filter
    ///
    /// # Errors
    /// Returns [`FilterError::Evaluation`] if the compiled tree cannot be
    /// evaluated; this does not happen for filters built by [`Filter::compile`].
    pub fn matches(&self, record: &HostRecord) -> Result<bool, FilterError> {
        self.expr.evaluate(record).map_err(|e| match e {
            FilterError::Evaluation(message) => FilterError::Evaluation(format!(
                "{message} (filter `{}`, host `{}`)",
                self.source, record.name
            )),
            other => other,
        })
    }

    /// Original filter text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled tree
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl From<Expr> for Filter {
    fn from(expr: Expr) -> Self {
        Self {
            source: expr.to_string(),
            expr,
        }
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
