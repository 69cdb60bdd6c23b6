//! Decode - Typed access to attribute trees
//!
//! `AttributeReader` reads attributes out of a `HashMap<String, Value>` and
//! fails fast with a path-qualified `TypeError` when a value has the wrong
//! shape, instead of silently treating it as unset.

use std::collections::HashMap;

use crate::resource::Value;
use crate::schema::TypeError;

/// Reader over one level of an attribute tree
#[derive(Debug, Clone, Copy)]
pub struct AttributeReader<'a> {
    attributes: &'a HashMap<String, Value>,
}

impl<'a> AttributeReader<'a> {
    pub fn new(attributes: &'a HashMap<String, Value>) -> Self {
        Self { attributes }
    }

    /// A string that must be present
    pub fn required_string(&self, name: &str) -> Result<&'a str, TypeError> {
        self.optional_string(name)?
            .ok_or_else(|| TypeError::MissingRequired {
                name: name.to_string(),
            })
    }

    /// A string that may be absent
    pub fn optional_string(&self, name: &str) -> Result<Option<&'a str>, TypeError> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(name, "String", other)),
        }
    }

    /// A string that may be absent; empty strings count as absent
    pub fn non_empty_string(&self, name: &str) -> Result<Option<&'a str>, TypeError> {
        Ok(self.optional_string(name)?.filter(|s| !s.is_empty()))
    }

    /// An integer that may be absent
    pub fn optional_int(&self, name: &str) -> Result<Option<i64>, TypeError> {
        match self.attributes.get(name) {
            None => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(mismatch(name, "Int", other)),
        }
    }

    /// An integer that may be absent; zero counts as absent
    pub fn non_zero_int(&self, name: &str) -> Result<Option<i64>, TypeError> {
        Ok(self.optional_int(name)?.filter(|n| *n != 0))
    }

    /// A map of strings that may be absent
    pub fn string_map(&self, name: &str) -> Result<HashMap<String, String>, TypeError> {
        match self.attributes.get(name) {
            None => Ok(HashMap::new()),
            Some(Value::Map(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    other => Err(TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(TypeError::TypeMismatch {
                            expected: "String".to_string(),
                            got: other.type_name(),
                        }),
                    }
                    .in_attribute(name)),
                })
                .collect(),
            Some(other) => Err(mismatch(name, "Map", other)),
        }
    }

    /// A block with at most one element
    ///
    /// Returns `None` when the block is absent or written as an empty list.
    pub fn single_block(&self, name: &str) -> Result<Option<AttributeReader<'a>>, TypeError> {
        let items = match self.attributes.get(name) {
            None => return Ok(None),
            Some(Value::List(items)) => items,
            Some(other) => return Err(mismatch(name, "Block", other)),
        };

        match items.as_slice() {
            [] => Ok(None),
            [Value::Map(map)] => Ok(Some(AttributeReader::new(map))),
            [other] => Err(TypeError::ListItemError {
                index: 0,
                inner: Box::new(TypeError::TypeMismatch {
                    expected: "Map".to_string(),
                    got: other.type_name(),
                }),
            }
            .in_attribute(name)),
            _ => Err(TypeError::TooManyItems {
                max: 1,
                got: items.len(),
            }
            .in_attribute(name)),
        }
    }

    /// A block with exactly one element
    pub fn required_block(&self, name: &str) -> Result<AttributeReader<'a>, TypeError> {
        self.single_block(name)?
            .ok_or_else(|| TypeError::MissingRequired {
                name: name.to_string(),
            })
    }
}

fn mismatch(name: &str, expected: &str, got: &Value) -> TypeError {
    TypeError::TypeMismatch {
        expected: expected.to_string(),
        got: got.type_name(),
    }
    .in_attribute(name)
}
