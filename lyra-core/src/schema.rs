//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, declaring attribute
//! types and mutability (required, computed, force-new). Schemas validate
//! configuration before any handler runs and decide whether a change can
//! be applied in place.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block, written as a list of maps
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::List(items)) => block.validate_items(items),

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Expected at most {max} block(s), got {got}")]
    TooManyItems { max: usize, got: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },
}

impl TypeError {
    /// Qualify this error with the attribute it was raised for
    pub fn in_attribute(self, name: impl Into<String>) -> Self {
        TypeError::AttributeError {
            name: name.into(),
            inner: Box::new(self),
        }
    }
}

impl Value {
    pub(crate) fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Value may be filled in by the remote side when not configured
    pub computed: bool,
    /// Changing the value requires replacing the resource
    pub force_new: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Schema of a nested block
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub max_items: Option<usize>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Wrap this block as an attribute type
    pub fn into_type(self) -> AttributeType {
        AttributeType::Block(Box::new(self))
    }

    fn validate_items(&self, items: &[Value]) -> Result<(), TypeError> {
        if let Some(max) = self.max_items
            && items.len() > max
        {
            return Err(TypeError::TooManyItems {
                max,
                got: items.len(),
            });
        }

        for (index, item) in items.iter().enumerate() {
            let wrap = |e: TypeError| TypeError::ListItemError {
                index,
                inner: Box::new(e),
            };
            let map = item.as_map().ok_or_else(|| {
                wrap(TypeError::TypeMismatch {
                    expected: "Map".to_string(),
                    got: item.type_name(),
                })
            })?;

            for (name, schema) in &self.attributes {
                if schema.required && !map.contains_key(name) {
                    return Err(wrap(TypeError::MissingRequired { name: name.clone() }));
                }
            }
            for (name, value) in map {
                let schema = self
                    .attributes
                    .get(name)
                    .ok_or_else(|| wrap(TypeError::UnknownAttribute { name: name.clone() }))?;
                schema
                    .attr_type
                    .validate(value)
                    .map_err(|e| wrap(e.in_attribute(name.clone())))?;
            }
        }
        Ok(())
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        // Type check each attribute
        for (name, value) in attributes {
            if let Some(schema) = self.attributes.get(name)
                && let Err(e) = schema.attr_type.validate(value)
            {
                errors.push(e.in_attribute(name.clone()));
            }
            // Unknown attributes are allowed (for flexibility)
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Names of force-new attributes whose desired value differs from the stored one
    ///
    /// Computed attributes (and computed block leaves) left unset or empty in the
    /// desired configuration never force replacement.
    pub fn replacement_attributes(
        &self,
        current: &HashMap<String, Value>,
        desired: &HashMap<String, Value>,
    ) -> Vec<String> {
        let mut names: Vec<String> = self
            .attributes
            .values()
            .filter(|schema| schema.force_new)
            .filter(|schema| {
                differs(
                    schema,
                    desired.get(&schema.name),
                    current.get(&schema.name),
                )
            })
            .map(|schema| schema.name.clone())
            .collect();
        names.sort();
        names
    }
}

fn differs(schema: &AttributeSchema, desired: Option<&Value>, current: Option<&Value>) -> bool {
    match (desired, current) {
        (None, _) if schema.computed => false,
        (Some(desired), _) if schema.computed && is_empty_value(desired) => false,
        (None, None) => false,
        (None, Some(current)) => !is_empty_value(current),
        (Some(desired), None) => !is_empty_value(desired),
        (Some(desired), Some(current)) => match &schema.attr_type {
            AttributeType::Block(block) => block_differs(block, desired, current),
            _ => desired != current,
        },
    }
}

fn block_differs(block: &BlockSchema, desired: &Value, current: &Value) -> bool {
    let first_map = |v: &Value| match v {
        Value::List(items) => items.first().and_then(Value::as_map).cloned(),
        _ => None,
    };
    let (desired, current) = match (first_map(desired), first_map(current)) {
        (None, None) => return false,
        (Some(d), Some(c)) => (d, c),
        (Some(d), None) => return !d.is_empty(),
        (None, Some(_)) => return false,
    };

    block
        .attributes
        .values()
        .any(|schema| differs(schema, desired.get(&schema.name), current.get(&schema.name)))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Int(n) => *n == 0,
        Value::Bool(b) => !b,
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Tags type (string-to-string map)
    pub fn tags() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }

    /// Enum of the given literal values
    pub fn one_of(values: &[&str]) -> AttributeType {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }
}
