//! Scalar attribute values
//!
//! Every host attribute holds exactly one [`AttributeValue`]. The set of
//! variants is closed so that comparison coercion and type tagging are total.

use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

/// A scalar attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// UTF-8 string
    String(String),
    /// Signed 64-bit integer
    Integer(i64),
    /// Finite 64-bit float
    Float(f64),
    /// Boolean
    Boolean(bool),
}

/// Variant discriminant of an [`AttributeValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueKind {
    /// Lower-case name used in XML `type` attributes
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric view of a value, used for coercing comparisons
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Compare two numbers; mixed integer/float promotes to float
    #[must_use]
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }
}

impl AttributeValue {
    /// Infer a typed value from free text
    ///
    /// `true`/`false` become booleans. A number becomes an integer or float
    /// only when rendering it gives back `text` exactly, so `007`, `+5`,
    /// `1e3` and `0.50` stay strings. Anything else stays a string too.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => return AttributeValue::Boolean(true),
            "false" => return AttributeValue::Boolean(false),
            _ => {}
        }
        let typed = match parse_number(text) {
            Some(Number::Int(n)) => AttributeValue::Integer(n),
            Some(Number::Float(n)) => AttributeValue::Float(n),
            None => return AttributeValue::String(text.to_string()),
        };
        if typed.to_string() == text {
            typed
        } else {
            AttributeValue::String(text.to_string())
        }
    }

    /// Variant of this value
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::String(_) => ValueKind::String,
            AttributeValue::Integer(_) => ValueKind::Integer,
            AttributeValue::Float(_) => ValueKind::Float,
            AttributeValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    /// Numeric view; strings that spell a number count as numbers
    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            AttributeValue::Integer(n) => Some(Number::Int(*n)),
            AttributeValue::Float(n) => Some(Number::Float(*n)),
            AttributeValue::String(s) => parse_number(s.trim()),
            AttributeValue::Boolean(_) => None,
        }
    }

    /// Boolean payload, if this is a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Text rendering used by every text-based output format.
///
/// Floats use the shortest representation that reparses to the same value
/// and always carry a fractional part or exponent (`2.0`, not `2`).
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Integer(n) => write!(f, "{n}"),
            AttributeValue::Float(n) => write!(f, "{n:?}"),
            AttributeValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::Integer(n) => serializer.serialize_i64(*n),
            AttributeValue::Float(n) => serializer.serialize_f64(*n),
            AttributeValue::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

struct AttributeValueVisitor;

impl Visitor<'_> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, integer, float or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(AttributeValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(AttributeValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(AttributeValue::Integer)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &"an integer within i64"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.is_finite() {
            Ok(AttributeValue::Float(v))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &"a finite float"))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(AttributeValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(AttributeValue::String(v))
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AttributeValueVisitor)
    }
}

/// Parse an optionally signed decimal number.
///
/// Only plain decimal syntax is accepted, so `inf`, `NaN` and hex never
/// count as numbers.
pub(crate) fn parse_number(text: &str) -> Option<Number> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !digits
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
    {
        return None;
    }
    if digits.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::Int(n));
        }
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Number::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer() {
        assert_eq!(AttributeValue::infer("8"), AttributeValue::Integer(8));
        assert_eq!(AttributeValue::infer("-3"), AttributeValue::Integer(-3));
        assert_eq!(AttributeValue::infer("2.5"), AttributeValue::Float(2.5));
        assert_eq!(AttributeValue::infer("1e21"), AttributeValue::Float(1e21));
        assert_eq!(AttributeValue::infer("true"), AttributeValue::Boolean(true));
        assert_eq!(AttributeValue::infer("intel"), AttributeValue::from("intel"));
        assert_eq!(AttributeValue::infer("inf"), AttributeValue::from("inf"));
        assert_eq!(AttributeValue::infer("NaN"), AttributeValue::from("NaN"));
        assert_eq!(AttributeValue::infer("1.2.3"), AttributeValue::from("1.2.3"));
        assert_eq!(AttributeValue::infer(""), AttributeValue::from(""));
    }

    #[test]
    fn test_infer_keeps_non_canonical_text() {
        for text in ["007", "+3120", "1e3", "5.", "0.50", "-0", ".5", "99999999999999999999"] {
            let value = AttributeValue::infer(text);
            assert_eq!(value, AttributeValue::from(text), "{text}");
            assert_eq!(value.to_string(), text);
        }
    }

    #[test]
    fn test_non_canonical_text_still_compares_as_number() {
        assert_eq!(AttributeValue::infer("007").as_number(), Some(Number::Int(7)));
        assert_eq!(AttributeValue::infer("0.50").as_number(), Some(Number::Float(0.5)));
    }

    #[test]
    fn test_display_keeps_float_marker() {
        assert_eq!(AttributeValue::Float(2.0).to_string(), "2.0");
        assert_eq!(AttributeValue::Float(0.1).to_string(), "0.1");
        assert_eq!(AttributeValue::Integer(2).to_string(), "2");
        assert_eq!(AttributeValue::Boolean(false).to_string(), "false");
    }

    #[test]
    fn test_float_display_reparses() {
        for n in [0.1, 1.0 / 3.0, 1e21, -2.5e-7, 123_456.789] {
            let text = AttributeValue::Float(n).to_string();
            assert_eq!(text.parse::<f64>().unwrap(), n);
        }
    }

    #[test]
    fn test_number_compare() {
        assert_eq!(
            Number::Int(4).compare(Number::Float(4.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(Number::Int(8).compare(Number::Int(4)), Some(Ordering::Greater));
        assert_eq!(
            Number::Float(3.5).compare(Number::Int(4)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_string_as_number() {
        assert_eq!(AttributeValue::from("8").as_number(), Some(Number::Int(8)));
        assert_eq!(AttributeValue::from("abc").as_number(), None);
        assert_eq!(AttributeValue::Boolean(true).as_number(), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_types() {
        let json = r#"{"a":"x","b":3,"c":3.0,"d":true}"#;
        let map: std::collections::BTreeMap<String, AttributeValue> =
            serde_json::from_str(json).unwrap();
        assert_eq!(map["b"].kind(), ValueKind::Integer);
        assert_eq!(map["c"].kind(), ValueKind::Float);
        assert_eq!(serde_json::to_string(&map).unwrap(), json);
    }

    #[test]
    fn test_rejects_nested_values() {
        let result: Result<AttributeValue, _> = serde_json::from_str(r#"{"x":1}"#);
        assert!(result.is_err());
        let result: Result<AttributeValue, _> = serde_json::from_str("[1,2]");
        assert!(result.is_err());
        let result: Result<AttributeValue, _> = serde_json::from_str("null");
        assert!(result.is_err());
    }
}
