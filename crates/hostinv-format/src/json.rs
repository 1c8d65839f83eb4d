//! JSON array output

use hostinv_core::HostRecord;
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};

use crate::error::FormatError;
use crate::traits::{FormatRequest, OutputFormatter};

/// Pretty-printed array of `{"name", "attributes"}` objects
///
/// Integers, floats and booleans stay native JSON values.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let hosts: Vec<HostView<'_>> = request
            .hosts()
            .iter()
            .map(|host| HostView { host, request })
            .collect();
        let mut out = serde_json::to_string_pretty(&hosts)?;
        out.push('\n');
        Ok(out)
    }
}

struct HostView<'a> {
    host: &'a HostRecord,
    request: &'a FormatRequest<'a>,
}

struct AttributesView<'a>(&'a HostView<'a>);

impl Serialize for HostView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Host", 2)?;
        state.serialize_field("name", &self.host.name)?;
        state.serialize_field("attributes", &AttributesView(self))?;
        state.end()
    }
}

impl Serialize for AttributesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = self.0;
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in view.request.present(view.host) {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}
