//! hostinv-format: Output formatters for host inventories
//!
//! Every format implements [`OutputFormatter`] and is looked up by name
//! through a [`FormatterRegistry`]:
//!
//! ```
//! use hostinv_format::{FormatRequest, FormatterRegistry};
//!
//! let registry = FormatterRegistry::default();
//! let json = registry.get("json").unwrap();
//! assert_eq!(json.format(&FormatRequest::new(&[])).unwrap(), "[]\n");
//! ```

pub mod block;
pub mod delimited;
pub mod error;
pub mod json;
pub mod registry;
pub mod script;
pub mod table;
pub mod traits;
pub mod xml;

pub use block::BlockFormatter;
pub use delimited::{CsvFormatter, Rfc4180CsvFormatter, TypeTag, TypedCsvFormatter, type_tag};
pub use error::FormatError;
pub use json::JsonFormatter;
pub use registry::FormatterRegistry;
pub use script::ScriptFormatter;
pub use table::TableFormatter;
pub use traits::{FormatRequest, OutputFormatter};
pub use xml::{XmlFormatter, element_name};
