//! Output formatter trait and its input

use hostinv_core::{AttributeValue, HostRecord, field_union};

use crate::error::FormatError;

/// Hosts to render and the fields to render them with
#[derive(Debug, Clone)]
pub struct FormatRequest<'a> {
    hosts: &'a [HostRecord],
    fields: Vec<String>,
}

impl<'a> FormatRequest<'a> {
    /// Render every attribute, fields sorted by name
    #[must_use]
    pub fn new(hosts: &'a [HostRecord]) -> Self {
        Self {
            hosts,
            fields: field_union(hosts),
        }
    }

    /// Render only `fields`, in the given order
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Hosts in result order
    #[must_use]
    pub fn hosts(&self) -> &'a [HostRecord] {
        self.hosts
    }

    /// Field order used by every formatter
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Fields of `host` that are selected and present, in field order
    pub fn present<'r>(
        &'r self,
        host: &'r HostRecord,
    ) -> impl Iterator<Item = (&'r str, &'r AttributeValue)> + 'r {
        self.fields
            .iter()
            .filter_map(move |field| host.get(field).map(|value| (field.as_str(), value)))
    }

    /// One cell per selected field; missing attributes are `None`
    pub fn cells<'r>(
        &'r self,
        host: &'r HostRecord,
    ) -> impl Iterator<Item = Option<&'r AttributeValue>> + 'r {
        self.fields.iter().map(move |field| host.get(field))
    }
}

/// Renders a host sequence into one output string
pub trait OutputFormatter: Send + Sync {
    /// Name used to select this formatter (`--output <name>`)
    fn name(&self) -> &'static str;

    /// Render the request; the result is complete or an error, never partial
    ///
    /// # Errors
    /// Returns [`FormatError`] if the underlying writer fails.
    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError>;
}

impl std::fmt::Debug for dyn OutputFormatter + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputFormatter")
            .field("name", &self.name())
            .finish()
    }
}
