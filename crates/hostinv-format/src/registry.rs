//! Formatter lookup by name

use tracing::debug;

use crate::block::BlockFormatter;
use crate::delimited::{CsvFormatter, Rfc4180CsvFormatter, TypedCsvFormatter};
use crate::error::FormatError;
use crate::json::JsonFormatter;
use crate::script::ScriptFormatter;
use crate::table::TableFormatter;
use crate::traits::OutputFormatter;
use crate::xml::XmlFormatter;

/// Formatters keyed by [`OutputFormatter::name`]
///
/// [`FormatterRegistry::default`] holds the eight built-in formats. A format
/// registered under an existing name replaces the earlier one.
pub struct FormatterRegistry {
    formatters: Vec<Box<dyn OutputFormatter>>,
}

impl FormatterRegistry {
    /// Registry with no formats
    #[must_use]
    pub fn new() -> Self {
        Self {
            formatters: Vec::new(),
        }
    }

    /// Add or replace a formatter
    pub fn register(&mut self, formatter: Box<dyn OutputFormatter>) {
        let name = formatter.name();
        if let Some(slot) = self.formatters.iter_mut().find(|f| f.name() == name) {
            debug!(format = name, "replacing registered formatter");
            *slot = formatter;
        } else {
            self.formatters.push(formatter);
        }
    }

    /// Look up a formatter by name
    ///
    /// # Errors
    /// Returns [`FormatError::UnsupportedFormat`] naming every registered
    /// format when `name` is unknown.
    pub fn get(&self, name: &str) -> Result<&dyn OutputFormatter, FormatError> {
        self.formatters
            .iter()
            .find(|f| f.name() == name)
            .map(|f| &**f)
            .ok_or_else(|| FormatError::UnsupportedFormat {
                requested: name.to_string(),
                supported: self.names().into_iter().map(str::to_string).collect(),
            })
    }

    /// Registered names, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.formatters.iter().map(|f| f.name()).collect()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TableFormatter));
        registry.register(Box::new(JsonFormatter));
        registry.register(Box::new(XmlFormatter));
        registry.register(Box::new(CsvFormatter));
        registry.register(Box::new(Rfc4180CsvFormatter));
        registry.register(Box::new(TypedCsvFormatter));
        registry.register(Box::new(BlockFormatter));
        registry.register(Box::new(ScriptFormatter));
        registry
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("formats", &self.names())
            .finish()
    }
}
