//! hostinv-core: host records and the filter expression engine
//!
//! Holds the attribute value model, host data parsing, the filter
//! expression tokenizer/parser/evaluator and the query executor that
//! applies a compiled filter to a sequence of hosts.

pub mod error;
pub mod expr;
pub mod input;
pub mod query;
pub mod record;
pub mod value;

pub use error::{DataError, FilterError};
pub use expr::{BinaryOp, Expr, Filter};
pub use input::{attributes_from_json, parse_host_data};
pub use query::{Select, apply, select};
pub use record::{Attributes, HostRecord, field_union, validate_field_name, validate_host_name};
pub use value::{AttributeValue, Number, ValueKind};
