//! Resource tag handling shared by AWS resource types

use std::collections::HashMap;

use lyra_core::resource::Value;

/// Keys with this prefix are managed by AWS and never read or written
pub const RESERVED_PREFIX: &str = "aws:";

/// Drop AWS-reserved tags
pub fn ignore_aws(tags: HashMap<String, String>) -> HashMap<String, String> {
    tags.into_iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .collect()
}

pub fn to_value(tags: &HashMap<String, String>) -> Value {
    Value::Map(
        tags.iter()
            .map(|(k, v)| (k.clone(), Value::string(v)))
            .collect(),
    )
}

/// Tag changes to apply to a resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagChanges {
    /// Keys to untag, sorted
    pub removed: Vec<String>,
    /// Keys to add or overwrite
    pub upserted: HashMap<String, String>,
}

impl TagChanges {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.upserted.is_empty()
    }
}

/// Difference between the stored and desired tag sets, ignoring reserved keys
pub fn diff(old: &HashMap<String, String>, new: &HashMap<String, String>) -> TagChanges {
    let mut removed: Vec<String> = old
        .keys()
        .filter(|key| !key.starts_with(RESERVED_PREFIX) && !new.contains_key(*key))
        .cloned()
        .collect();
    removed.sort();

    let upserted = new
        .iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_PREFIX))
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    TagChanges { removed, upserted }
}
