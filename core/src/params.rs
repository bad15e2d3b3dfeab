//! Parameter values and their transport-level key/value encoding.
//!
//! # Encoding rules
//! - `Scalar` becomes one pair, value untouched. The form encoder escapes it.
//! - `List` becomes one pair with the elements joined by `,`. An empty list
//!   emits nothing, so the server applies its default. An element containing
//!   `,` cannot be represented and is rejected.
//! - `Records` flattens row `i`, field `k` into `name[i][k]`, rows and fields
//!   in insertion order. The API correlates rows by position, so the order
//!   must be stable.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Separator used when a list parameter is flattened into one value.
pub const LIST_DELIMITER: char = ',';

/// Value of a named request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
    Records(Vec<Record>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<Record>> for ParamValue {
    fn from(records: Vec<Record>) -> Self {
        ParamValue::Records(records)
    }
}

/// One row of a record collection parameter: field name -> value, kept in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<String, ParamValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Encode one named parameter into transport key/value pairs.
pub fn encode(name: &str, value: &ParamValue) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    encode_into(name, value, &mut pairs)?;
    Ok(pairs)
}

pub(crate) fn encode_into(
    name: &str,
    value: &ParamValue,
    out: &mut Vec<(String, String)>,
) -> Result<()> {
    if name.is_empty() {
        return Err(Error::configuration("parameter name must not be empty"));
    }

    match value {
        ParamValue::Scalar(v) => out.push((name.to_string(), v.clone())),
        ParamValue::List(values) => {
            if let Some(joined) = join_list(name, values)? {
                out.push((name.to_string(), joined));
            }
        }
        ParamValue::Records(records) => {
            for (index, record) in records.iter().enumerate() {
                for (field, field_value) in record.fields() {
                    validate_field_name(name, field)?;
                    if matches!(field_value, ParamValue::Records(_)) {
                        return Err(Error::configuration(format!(
                            "field `{field}` of `{name}[{index}]` is a nested record collection"
                        )));
                    }
                    encode_into(&format!("{name}[{index}][{field}]"), field_value, out)?;
                }
            }
        }
    }

    Ok(())
}

fn join_list(name: &str, values: &[String]) -> Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    if let Some(bad) = values.iter().find(|v| v.contains(LIST_DELIMITER)) {
        return Err(Error::configuration(format!(
            "value {bad:?} of list parameter `{name}` contains the `{LIST_DELIMITER}` delimiter"
        )));
    }
    Ok(Some(values.join(&LIST_DELIMITER.to_string())))
}

fn validate_field_name(name: &str, field: &str) -> Result<()> {
    if field.is_empty() {
        return Err(Error::configuration(format!(
            "record field name in `{name}` must not be empty"
        )));
    }
    if field.contains(['[', ']']) {
        return Err(Error::configuration(format!(
            "record field name {field:?} in `{name}` must not contain brackets"
        )));
    }
    Ok(())
}
