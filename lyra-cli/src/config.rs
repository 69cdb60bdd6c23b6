//! JSON configuration file for the `lyra` CLI
//!
//! ```json
//! {
//!   "provider": { "region": "us-east-1", "profile": "dev" },
//!   "state": { "path": "lyra.state.json" },
//!   "resources": [
//!     {
//!       "type": "route53_vpc_association_authorization",
//!       "name": "peer",
//!       "attributes": { "zone_id": "Z1", "vpc_id": "vpc-1" }
//!     }
//!   ]
//! }
//! ```
//!
//! Nested blocks are written as arrays holding one object.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lyra_core::resource::{Resource, ResourceId, Value};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceConfig {
    /// Convert into a resource; non-integer numbers are rejected with their path
    pub fn to_resource(&self) -> Result<Resource, String> {
        let attributes = Value::map_from_json(&self.attributes)
            .map_err(|e| format!("Resource '{}': {}", self.name, e))?;
        Ok(Resource {
            id: ResourceId::new(&self.resource_type, &self.name),
            attributes,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Config = serde_json::from_str(content).map_err(|e| e.to_string())?;

        let mut seen = HashSet::new();
        for resource in &config.resources {
            if !seen.insert(resource.name.as_str()) {
                return Err(format!("Duplicate resource name '{}'", resource.name));
            }
        }
        Ok(config)
    }

    pub fn resources(&self) -> Result<Vec<Resource>, String> {
        self.resources.iter().map(ResourceConfig::to_resource).collect()
    }

    /// The resource declared with `name`
    pub fn resource(&self, name: &str) -> Result<Resource, String> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| format!("No resource named '{}' in configuration", name))?
            .to_resource()
    }
}
