//! Host records

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::value::AttributeValue;

/// Attribute mapping of a host, ordered by attribute name
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One inventory entry: a host name and its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Unique host name
    pub name: String,
    /// Open attribute mapping
    #[serde(default)]
    pub attributes: Attributes,
}

impl HostRecord {
    /// Create a record after validating the host name
    ///
    /// # Errors
    /// Returns [`DataError::InvalidHostName`] for an empty or blank name.
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Result<Self, DataError> {
        let name = validate_host_name(name.into())?;
        Ok(Self { name, attributes })
    }

    /// Look up one attribute
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }

    /// Set one attribute, returning the previous value
    ///
    /// # Errors
    /// Returns [`DataError::InvalidFieldName`] for an empty or blank field name.
    pub fn set(
        &mut self,
        field: impl Into<String>,
        value: AttributeValue,
    ) -> Result<Option<AttributeValue>, DataError> {
        let field = validate_field_name(field.into())?;
        Ok(self.attributes.insert(field, value))
    }

    /// Remove one attribute
    pub fn remove(&mut self, field: &str) -> Option<AttributeValue> {
        self.attributes.remove(field)
    }
}

/// Sorted union of attribute names across `records`
#[must_use]
pub fn field_union<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a HostRecord>,
{
    let fields: BTreeSet<&str> = records
        .into_iter()
        .flat_map(|r| r.attributes.keys().map(String::as_str))
        .collect();
    fields.into_iter().map(str::to_string).collect()
}

/// Reject empty or blank host names
///
/// # Errors
/// Returns [`DataError::InvalidHostName`] when the name is blank.
pub fn validate_host_name(name: String) -> Result<String, DataError> {
    if name.trim().is_empty() {
        return Err(DataError::InvalidHostName(name));
    }
    Ok(name)
}

/// Reject empty or blank field names
///
/// # Errors
/// Returns [`DataError::InvalidFieldName`] when the name is blank.
pub fn validate_field_name(name: String) -> Result<String, DataError> {
    if name.trim().is_empty() {
        return Err(DataError::InvalidFieldName(name));
    }
    Ok(name)
}
