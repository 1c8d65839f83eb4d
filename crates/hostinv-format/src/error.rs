//! Error types for hostinv-format

use thiserror::Error;

/// Errors that can occur while selecting or running a formatter
#[derive(Error, Debug)]
pub enum FormatError {
    /// No formatter is registered under the requested name
    #[error("unsupported output format `{requested}` (supported: {})", supported.join(", "))]
    UnsupportedFormat {
        /// Name that was asked for
        requested: String,
        /// Registered names, in registration order
        supported: Vec<String>,
    },

    /// CSV writer failure
    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    /// XML writer failure
    #[error("XML output failed: {0}")]
    Xml(String),

    /// JSON serialization failure
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendered bytes were not UTF-8
    #[error("output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
