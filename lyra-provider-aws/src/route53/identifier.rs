//! Composite identifier of a VPC association authorization
//!
//! Route 53 exposes no single-field ID for an authorization, so it is stored
//! as `<zone id>:<vpc id>`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected format of ID ({id:?}), expected ZONEID:VPCID")]
pub struct IdentifierError {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationId {
    pub zone_id: String,
    pub vpc_id: String,
}

impl AuthorizationId {
    pub fn new(zone_id: impl Into<String>, vpc_id: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            vpc_id: vpc_id.into(),
        }
    }
}

impl fmt::Display for AuthorizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.zone_id, self.vpc_id)
    }
}

impl FromStr for AuthorizationId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [zone_id, vpc_id] if !zone_id.is_empty() && !vpc_id.is_empty() => {
                Ok(Self::new(*zone_id, *vpc_id))
            }
            _ => Err(IdentifierError { id: s.to_string() }),
        }
    }
}
