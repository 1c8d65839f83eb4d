//! XML document output
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <hosts>
//!   <host name="web01">
//!     <cores type="integer">8</cores>
//!     <_2nd_nic key="2nd nic" type="string">eth1</_2nd_nic>
//!   </host>
//! </hosts>
//! ```
//!
//! Attribute names become element names through [`element_name`]. When the
//! name had to change, the original is kept in a `key` attribute so no
//! information is lost.
//!
//! Text is escaped so that a conforming parser reads back the exact value:
//! `\r` is written as `&#13;`, and inside attributes tab and newline become
//! character references too. A value holding a character XML 1.0 cannot
//! represent at all (C0 controls other than tab, newline and carriage
//! return, `U+FFFE`, `U+FFFF`) is written as base64 of its UTF-8 bytes with
//! `encoding="base64"` on the element. Host names and attribute names with
//! such characters are rejected with [`FormatError::Xml`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::FormatError;
use crate::traits::{FormatRequest, OutputFormatter};

/// One `<host>` element per host, one child element per attribute
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormatter;

impl OutputFormatter for XmlFormatter {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        if request.hosts().is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new("hosts")))
                .map_err(xml_error)?;
        } else {
            writer
                .write_event(Event::Start(BytesStart::new("hosts")))
                .map_err(xml_error)?;
            for host in request.hosts() {
                let name = escape_attribute(&host.name).ok_or_else(|| {
                    FormatError::Xml(format!(
                        "host name {:?} contains a character XML 1.0 cannot represent",
                        host.name
                    ))
                })?;
                let start = BytesStart::new("host")
                    .with_attributes([(b"name".as_slice(), name.as_bytes())]);
                let mut fields = request.present(host).peekable();
                if fields.peek().is_none() {
                    writer.write_event(Event::Empty(start)).map_err(xml_error)?;
                    continue;
                }

                writer.write_event(Event::Start(start)).map_err(xml_error)?;
                for (field, value) in fields {
                    let element = element_name(field);
                    let mut child = BytesStart::new(element.as_str());
                    if element != field {
                        let key = escape_attribute(field).ok_or_else(|| {
                            FormatError::Xml(format!(
                                "attribute name {field:?} contains a character XML 1.0 cannot represent"
                            ))
                        })?;
                        child.push_attribute((b"key".as_slice(), key.as_bytes()));
                    }
                    child.push_attribute(("type", value.kind().as_str()));

                    let raw = value.to_string();
                    let text = match escape_text(&raw) {
                        Some(text) => text,
                        None => {
                            child.push_attribute(("encoding", "base64"));
                            STANDARD.encode(raw.as_bytes())
                        }
                    };

                    writer.write_event(Event::Start(child)).map_err(xml_error)?;
                    writer
                        .write_event(Event::Text(BytesText::from_escaped(text)))
                        .map_err(xml_error)?;
                    writer
                        .write_event(Event::End(BytesEnd::new(element.as_str())))
                        .map_err(xml_error)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new("host")))
                    .map_err(xml_error)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("hosts")))
                .map_err(xml_error)?;
        }

        let mut out = String::from_utf8(writer.into_inner())?;
        out.push('\n');
        Ok(out)
    }
}

/// Map an attribute name to a valid XML element name
///
/// Every character outside `[A-Za-z0-9_.-]` becomes `_`. A `_` is
/// prepended when the result does not start with a letter or `_`, or when
/// it starts with the reserved prefix `xml` in any letter case.
#[must_use]
pub fn element_name(field: &str) -> String {
    let mut name: String = field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let valid_start = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_');
    let reserved = name
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml"));
    if !valid_start || reserved {
        name.insert(0, '_');
    }
    name
}

/// Characters allowed by the XML 1.0 `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Escape element content; `None` when `raw` cannot appear in XML 1.0
fn escape_text(raw: &str) -> Option<String> {
    if !raw.chars().all(is_xml_char) {
        return None;
    }
    Some(escape(raw).replace('\r', "&#13;"))
}

/// Escape an attribute value so whitespace survives attribute normalization
fn escape_attribute(raw: &str) -> Option<String> {
    let text = escape_text(raw)?;
    Some(text.replace('\t', "&#9;").replace('\n', "&#10;"))
}

fn xml_error(e: impl std::fmt::Display) -> FormatError {
    FormatError::Xml(e.to_string())
}
