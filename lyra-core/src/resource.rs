//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "ecs_capacity_provider")
    pub resource_type: String,
    /// Resource name (local name chosen in configuration)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
///
/// Nested blocks are represented the way the configuration writes them:
/// a `List` holding at most one `Map`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Wrap a single map as a one-element block
    pub fn block(attributes: HashMap<String, Value>) -> Self {
        Value::List(vec![Value::Map(attributes)])
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a JSON value into an attribute value
    ///
    /// `null` has no attribute representation and yields `None`. Numbers
    /// must be integers; anything else is rejected with its path.
    pub fn from_json(json: &serde_json::Value) -> Result<Option<Value>, JsonValueError> {
        Self::from_json_at(json, "")
    }

    /// Convert a JSON object into attributes, dropping `null` entries
    pub fn map_from_json(
        map: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<HashMap<String, Value>, JsonValueError> {
        Self::map_from_json_at(map, "")
    }

    fn map_from_json_at(
        map: &serde_json::Map<String, serde_json::Value>,
        path: &str,
    ) -> Result<HashMap<String, Value>, JsonValueError> {
        let mut attributes = HashMap::new();
        for (key, value) in map {
            let path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            if let Some(value) = Self::from_json_at(value, &path)? {
                attributes.insert(key.clone(), value);
            }
        }
        Ok(attributes)
    }

    fn from_json_at(json: &serde_json::Value, path: &str) -> Result<Option<Value>, JsonValueError> {
        let value = match json {
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(n) => Value::Int(n),
                None => {
                    return Err(JsonValueError::NotAnInteger {
                        path: path.to_string(),
                        value: n.to_string(),
                    });
                }
            },
            serde_json::Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    if let Some(value) = Self::from_json_at(item, &format!("{}[{}]", path, index))? {
                        values.push(value);
                    }
                }
                Value::List(values)
            }
            serde_json::Value::Object(map) => Value::Map(Self::map_from_json_at(map, path)?),
            serde_json::Value::Null => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Convert an attribute value into JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Error converting JSON into attribute values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonValueError {
    #[error("{path}: expected an integer, got {value}")]
    NotAnInteger { path: String, value: String },
}

impl JsonValueError {
    /// Qualify the error path with the enclosing attribute name
    pub fn in_attribute(self, name: &str) -> Self {
        match self {
            JsonValueError::NotAnInteger { path, value } => {
                let path = if path.is_empty() {
                    name.to_string()
                } else if path.starts_with('[') {
                    format!("{}{}", name, path)
                } else {
                    format!("{}.{}", name, path)
                };
                JsonValueError::NotAnInteger { path, value }
            }
        }
    }
}

/// Desired state declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Current state fetched from actual infrastructure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Durable remote identifier (composite key or ARN)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}
