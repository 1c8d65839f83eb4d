//! Host data parsing for `create`
//!
//! Accepts three shapes, detected from the text itself:
//! - a JSON object: `{"cores": 8, "site": "AMS"}`
//! - an XML fragment: `<host><cores>8</cores><site>AMS</site></host>`
//! - whitespace separated pairs: `cores=8 site=AMS`

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde_json::Value;
use tracing::debug;

use crate::error::DataError;
use crate::record::{Attributes, validate_field_name};
use crate::value::AttributeValue;

/// Parse host data in any of the supported shapes
///
/// # Errors
/// Returns [`DataError`] if the text is malformed, a field name is blank
/// or a JSON value is not a scalar.
pub fn parse_host_data(text: &str) -> Result<Attributes, DataError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        debug!("parsing host data as JSON");
        let value: Value =
            serde_json::from_str(trimmed).map_err(|e| DataError::Malformed(e.to_string()))?;
        attributes_from_json(value)
    } else if trimmed.starts_with('<') && trimmed.ends_with('>') {
        debug!("parsing host data as XML");
        parse_xml(trimmed)
    } else {
        debug!("parsing host data as key=value pairs");
        parse_pairs(trimmed)
    }
}

/// Convert a JSON object into attributes, rejecting non-scalar values
///
/// # Errors
/// Returns [`DataError`] if `value` is not an object or holds a nested value.
pub fn attributes_from_json(value: Value) -> Result<Attributes, DataError> {
    let Value::Object(map) = value else {
        return Err(DataError::Malformed(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        )));
    };

    let mut attributes = Attributes::new();
    for (field, value) in map {
        let field = validate_field_name(field)?;
        let value = scalar_from_json(&field, value)?;
        attributes.insert(field, value);
    }
    Ok(attributes)
}

fn scalar_from_json(field: &str, value: Value) -> Result<AttributeValue, DataError> {
    match value {
        Value::String(s) => Ok(AttributeValue::String(s)),
        Value::Bool(b) => Ok(AttributeValue::Boolean(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(AttributeValue::Integer(i))
            } else if n.is_u64() {
                Err(DataError::Malformed(format!(
                    "attribute `{field}`: integer {n} is out of range"
                )))
            } else {
                n.as_f64()
                    .map(AttributeValue::Float)
                    .ok_or_else(|| DataError::Malformed(format!("attribute `{field}`: {n}")))
            }
        }
        other => Err(DataError::NonScalar {
            field: field.to_string(),
            found: json_kind(&other).to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_pairs(text: &str) -> Result<Attributes, DataError> {
    let mut attributes = Attributes::new();
    for item in text.split_whitespace() {
        let (field, value) = item
            .split_once('=')
            .ok_or_else(|| DataError::Malformed(format!("expected key=value, found `{item}`")))?;
        let field = validate_field_name(field.to_string())?;
        attributes.insert(field, AttributeValue::infer(value));
    }
    Ok(attributes)
}

/// Children of the root element become attributes; the root name is ignored
fn parse_xml(text: &str) -> Result<Attributes, DataError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut attributes = Attributes::new();
    let mut depth = 0usize;
    let mut current: Option<String> = None;
    let mut content = String::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            DataError::Malformed(format!(
                "XML error at position {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(start) => {
                depth += 1;
                match depth {
                    1 => {}
                    2 => {
                        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                        current = Some(validate_field_name(name)?);
                        content.clear();
                    }
                    _ => {
                        return Err(DataError::NonScalar {
                            field: current.unwrap_or_default(),
                            found: "nested element".to_string(),
                        });
                    }
                }
            }
            Event::Empty(empty) if depth == 1 => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                attributes.insert(validate_field_name(name)?, AttributeValue::String(String::new()));
            }
            Event::Text(text) if depth == 2 => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| DataError::Malformed(e.to_string()))?;
                content.push_str(&unescaped);
            }
            Event::CData(data) if depth == 2 => {
                content.push_str(&String::from_utf8_lossy(data.as_ref()));
            }
            Event::End(_) => {
                if depth == 2
                    && let Some(field) = current.take()
                {
                    attributes.insert(field, AttributeValue::infer(&content));
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let attrs = parse_host_data(r#"{"cores": 8, "site": "AMS", "load": 0.5, "monitored": true}"#)
            .unwrap();
        assert_eq!(attrs["cores"], AttributeValue::Integer(8));
        assert_eq!(attrs["site"], AttributeValue::from("AMS"));
        assert_eq!(attrs["load"], AttributeValue::Float(0.5));
        assert_eq!(attrs["monitored"], AttributeValue::Boolean(true));
    }

    #[test]
    fn test_parse_json_rejects_nested() {
        let err = parse_host_data(r#"{"disks": ["sda", "sdb"]}"#).unwrap_err();
        assert_eq!(
            err,
            DataError::NonScalar {
                field: "disks".to_string(),
                found: "array".to_string()
            }
        );
    }

    #[test]
    fn test_parse_pairs_infers_types() {
        let attrs = parse_host_data("processor=intel cores=4 monitored=false").unwrap();
        assert_eq!(attrs["processor"], AttributeValue::from("intel"));
        assert_eq!(attrs["cores"], AttributeValue::Integer(4));
        assert_eq!(attrs["monitored"], AttributeValue::Boolean(false));
    }

    #[test]
    fn test_parse_pairs_keeps_serial_numbers_verbatim() {
        let attrs = parse_host_data("serial=007 phone=+3120 qty=1e3 ver=5. ratio=0.50").unwrap();
        for (field, text) in [
            ("serial", "007"),
            ("phone", "+3120"),
            ("qty", "1e3"),
            ("ver", "5."),
            ("ratio", "0.50"),
        ] {
            assert_eq!(attrs[field], AttributeValue::from(text));
        }
    }

    #[test]
    fn test_parse_pairs_keeps_equals_in_value() {
        let attrs = parse_host_data("kernel_args=quiet=1").unwrap();
        assert_eq!(attrs["kernel_args"], AttributeValue::from("quiet=1"));
    }

    #[test]
    fn test_parse_pairs_rejects_bare_words() {
        assert!(matches!(
            parse_host_data("cores=4 oops"),
            Err(DataError::Malformed(_))
        ));
        assert!(matches!(
            parse_host_data("=4"),
            Err(DataError::InvalidFieldName(_))
        ));
    }

    #[test]
    fn test_parse_xml() {
        let attrs =
            parse_host_data("<host><cores>8</cores><site>A&amp;B</site><rack/></host>").unwrap();
        assert_eq!(attrs["cores"], AttributeValue::Integer(8));
        assert_eq!(attrs["site"], AttributeValue::from("A&B"));
        assert_eq!(attrs["rack"], AttributeValue::from(""));
    }

    #[test]
    fn test_parse_xml_rejects_nesting() {
        assert!(matches!(
            parse_host_data("<host><disk><name>sda</name></disk></host>"),
            Err(DataError::NonScalar { .. })
        ));
    }

    #[test]
    fn test_empty_input_is_empty_mapping() {
        assert!(parse_host_data("").unwrap().is_empty());
    }
}
