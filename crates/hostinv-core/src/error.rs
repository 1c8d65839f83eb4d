//! Error types for hostinv-core

use thiserror::Error;

/// Errors raised while compiling or evaluating a filter expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed expression text
    #[error("syntax error at offset {offset} in `{expression}`: {message}")]
    Syntax {
        /// Full expression text
        expression: String,
        /// Byte offset of the offending token
        offset: usize,
        /// What went wrong
        message: String,
    },

    /// Well-formed expression with a shape that cannot be evaluated
    #[error("unsupported expression `{expression}`: {message}")]
    UnsupportedExpression {
        /// Full expression text
        expression: String,
        /// What went wrong
        message: String,
    },

    /// Evaluation could not produce a boolean
    #[error("evaluation error: {0}")]
    Evaluation(String),
}

impl FilterError {
    /// Byte offset of a syntax error, if any
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            FilterError::Syntax { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Errors raised while validating host names or parsing host data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Host name is empty or whitespace
    #[error("invalid host name: {0:?}")]
    InvalidHostName(String),

    /// Field name is empty or whitespace
    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),

    /// Attribute value is not a scalar
    #[error("attribute `{field}` is not a scalar value: {found}")]
    NonScalar {
        /// Attribute name
        field: String,
        /// Short description of the rejected value
        found: String,
    },

    /// Host data text could not be parsed
    #[error("failed to parse host data: {0}")]
    Malformed(String),
}
