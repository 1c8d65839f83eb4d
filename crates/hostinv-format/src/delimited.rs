//! Comma-separated output: plain, RFC 4180 and typed
//!
//! All three share one row layout: a `name` column followed by one column
//! per selected field, missing attributes left empty.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use hostinv_core::AttributeValue;

use crate::error::FormatError;
use crate::traits::{FormatRequest, OutputFormatter};

/// Comma-joined rows with no quoting
///
/// Values containing commas, quotes or line breaks are written verbatim and
/// will not survive a reparse. Use `rfc4180-csv` when that matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormatter;

/// RFC 4180 rows: quoted as necessary, CRLF line endings
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc4180CsvFormatter;

/// RFC 4180 quoting with a type tag column after every field
///
/// The header for fields `cores, site` is `name,cores,cores:type,site,site:type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedCsvFormatter;

/// Type tag written by [`TypedCsvFormatter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    /// No value to classify
    Unknown,
}

impl TypeTag {
    /// Tag as written to the output
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Number => "Number",
            TypeTag::Boolean => "Boolean",
            TypeTag::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a cell; total over every value a host can hold
#[must_use]
pub fn type_tag(value: Option<&AttributeValue>) -> TypeTag {
    match value {
        Some(AttributeValue::String(_)) => TypeTag::String,
        Some(AttributeValue::Integer(_) | AttributeValue::Float(_)) => TypeTag::Number,
        Some(AttributeValue::Boolean(_)) => TypeTag::Boolean,
        None => TypeTag::Unknown,
    }
}

impl OutputFormatter for CsvFormatter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let mut builder = WriterBuilder::new();
        builder
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'));
        write_rows(&builder, request, false)
    }
}

impl OutputFormatter for Rfc4180CsvFormatter {
    fn name(&self) -> &'static str {
        "rfc4180-csv"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let mut builder = WriterBuilder::new();
        builder
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF);
        write_rows(&builder, request, false)
    }
}

impl OutputFormatter for TypedCsvFormatter {
    fn name(&self) -> &'static str {
        "typed-csv"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let mut builder = WriterBuilder::new();
        builder
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'));
        write_rows(&builder, request, true)
    }
}

fn write_rows(
    builder: &WriterBuilder,
    request: &FormatRequest<'_>,
    typed: bool,
) -> Result<String, FormatError> {
    let mut writer = builder.from_writer(Vec::new());

    let mut header = vec!["name".to_string()];
    for field in request.fields() {
        header.push(field.clone());
        if typed {
            header.push(format!("{field}:type"));
        }
    }
    writer.write_record(&header)?;

    for host in request.hosts() {
        let mut row = vec![host.name.clone()];
        for cell in request.cells(host) {
            row.push(cell.map(ToString::to_string).unwrap_or_default());
            if typed {
                row.push(type_tag(cell).as_str().to_string());
            }
        }
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use hostinv_core::{Attributes, HostRecord};

    use super::*;

    fn host(name: &str, fields: &[(&str, AttributeValue)]) -> HostRecord {
        let attributes: Attributes = fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        HostRecord::new(name, attributes).unwrap()
    }

    fn sample() -> Vec<HostRecord> {
        vec![
            host(
                "web01",
                &[
                    ("cores", AttributeValue::Integer(8)),
                    ("owner", "Acme, Inc".into()),
                ],
            ),
            host("db01", &[("cores", AttributeValue::Integer(16))]),
        ]
    }

    #[test]
    fn test_plain_csv_does_not_quote() {
        let hosts = sample();
        let out = CsvFormatter.format(&FormatRequest::new(&hosts)).unwrap();
        assert_eq!(out, "name,cores,owner\nweb01,8,Acme, Inc\ndb01,16,\n");
    }

    #[test]
    fn test_rfc4180_quotes_and_uses_crlf() {
        let hosts = sample();
        let out = Rfc4180CsvFormatter
            .format(&FormatRequest::new(&hosts))
            .unwrap();
        assert_eq!(
            out,
            "name,cores,owner\r\nweb01,8,\"Acme, Inc\"\r\ndb01,16,\r\n"
        );
    }

    #[test]
    fn test_rfc4180_doubles_embedded_quotes() {
        let hosts = vec![host("web01", &[("note", "say \"hi\"".into())])];
        let out = Rfc4180CsvFormatter
            .format(&FormatRequest::new(&hosts))
            .unwrap();
        assert!(out.contains("\"say \"\"hi\"\"\""), "{out}");
    }

    #[test]
    fn test_typed_csv_header_and_tags() {
        let hosts = vec![
            host(
                "web01",
                &[
                    ("cores", AttributeValue::Integer(8)),
                    ("load", AttributeValue::Float(0.25)),
                    ("monitored", AttributeValue::Boolean(true)),
                ],
            ),
            host("db01", &[("site", "EIN".into())]),
        ];
        let out = TypedCsvFormatter
            .format(&FormatRequest::new(&hosts))
            .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "name,cores,cores:type,load,load:type,monitored,monitored:type,site,site:type",
                "web01,8,Number,0.25,Number,true,Boolean,,Unknown",
                "db01,,Unknown,,Unknown,,Unknown,EIN,String",
            ]
        );
    }

    #[test]
    fn test_type_tag_is_total() {
        assert_eq!(type_tag(Some(&"x".into())), TypeTag::String);
        assert_eq!(type_tag(Some(&AttributeValue::Integer(1))), TypeTag::Number);
        assert_eq!(type_tag(Some(&AttributeValue::Float(1.5))), TypeTag::Number);
        assert_eq!(type_tag(Some(&AttributeValue::Boolean(false))), TypeTag::Boolean);
        assert_eq!(type_tag(None), TypeTag::Unknown);
    }

    #[test]
    fn test_empty_is_header_only() {
        assert_eq!(CsvFormatter.format(&FormatRequest::new(&[])).unwrap(), "name\n");
        assert_eq!(
            Rfc4180CsvFormatter.format(&FormatRequest::new(&[])).unwrap(),
            "name\r\n"
        );
        assert_eq!(
            TypedCsvFormatter.format(&FormatRequest::new(&[])).unwrap(),
            "name\n"
        );
    }
}
